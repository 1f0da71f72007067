pub fn init() {
    let _ = env_logger::try_init();
}
