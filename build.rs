fn main() {
    println!("cargo:rerun-if-env-changed=APPARATUS_CONFIG");

    // Host builds (tests, fuzzing) run without the ESP-IDF environment.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
