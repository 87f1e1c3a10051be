//! Host link over UART (USB bridge on the relay board).
//!
//! Reads are non-blocking; an idle line reads as `Ok(0)` so the serial
//! drain step never stalls the loop.

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{ESP_FAIL, EspError};

use crate::error::LinkError;
use crate::link::SerialPort;

pub struct UsbSerial<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UsbSerial<'d> {
    pub fn new(
        uart: impl Peripheral<P = impl Uart> + 'd,
        tx: impl Peripheral<P = impl OutputPin> + 'd,
        rx: impl Peripheral<P = impl InputPin> + 'd,
        baud: u32,
    ) -> Result<Self, EspError> {
        let config = uart::config::Config::default().baudrate(Hertz(baud));
        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        log::info!("UART: host link at {} baud", baud);
        Ok(Self { uart })
    }
}

impl SerialPort for UsbSerial<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        self.uart
            .read(buf, NON_BLOCK)
            .map_err(|e| LinkError::Driver(e.code()))
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let mut rest = data;
        while !rest.is_empty() {
            let n = self.uart.write(rest).map_err(|e| LinkError::Driver(e.code()))?;
            if n == 0 {
                return Err(LinkError::Driver(ESP_FAIL as i32));
            }
            rest = &rest[n..];
        }
        Ok(())
    }
}
