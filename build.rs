fn main() {
    println!("cargo:rerun-if-env-changed=ATHENE_CONFIG_JSON");

    // Only the ESP-IDF build needs the sysenv forwarding; host builds
    // (tests, simulation) compile without embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
