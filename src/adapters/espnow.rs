//! ESP-NOW radio link between the relay and the sensor node.
//!
//! ESP-NOW rides on the Wi-Fi driver, so the station interface is started
//! (never connected) on the configured channel.  The receive callback runs
//! in the Wi-Fi task; it only copies the packet into [`RADIO_INBOX`].

use esp_idf_svc::espnow::{EspNow, PeerInfo};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{
    EspError, esp, esp_wifi_set_channel, wifi_interface_t_WIFI_IF_STA,
    wifi_second_chan_t_WIFI_SECOND_CHAN_NONE,
};
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};
use log::info;

use crate::error::LinkError;
use crate::inbound::RADIO_INBOX;
use crate::link::RadioPort;

pub struct EspNowRadio {
    // Keeps the Wi-Fi driver alive for as long as ESP-NOW is in use.
    _wifi: EspWifi<'static>,
    espnow: EspNow<'static>,
    peer: [u8; 6],
}

impl EspNowRadio {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        channel: u8,
        peer: [u8; 6],
    ) -> Result<Self, EspError> {
        let mut wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            channel: Some(channel),
            ..Default::default()
        }))?;
        wifi.start()?;
        // SAFETY: Wi-Fi is started; the channel call has no other preconditions.
        esp!(unsafe { esp_wifi_set_channel(channel, wifi_second_chan_t_WIFI_SECOND_CHAN_NONE) })?;

        let espnow = EspNow::take()?;
        espnow.register_recv_cb(|_info, data: &[u8]| {
            // A full queue counts the drop itself.
            let _ = RADIO_INBOX.push(data);
        })?;
        espnow.add_peer(PeerInfo {
            peer_addr: peer,
            channel,
            ifidx: wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        })?;

        info!(
            "ESP-NOW: channel {}, peer {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            channel, peer[0], peer[1], peer[2], peer[3], peer[4], peer[5]
        );
        Ok(Self { _wifi: wifi, espnow, peer })
    }
}

impl RadioPort for EspNowRadio {
    fn send(&mut self, packet: &[u8]) -> Result<(), LinkError> {
        self.espnow
            .send(self.peer, packet)
            .map_err(|e| LinkError::Driver(e.code()))
    }
}
