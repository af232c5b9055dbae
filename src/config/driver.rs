/// Driver timing and retry parameters
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Read timeout for ordinary command acknowledgements, in milliseconds
    pub command_timeout_ms: u32,
    /// Read timeout around network round trips (save, join, uplink outcome)
    pub network_timeout_ms: u32,
    /// Pause before draining input for a standalone query
    pub command_delay_ms: u32,
    /// Pause after each join attempt
    pub settle_delay_ms: u32,
    /// Pause before retrying after `busy` or `no_free_ch`
    pub retry_delay_ms: u32,
    /// Total uplink attempts per transmission, busy retries included
    pub max_tx_attempts: u8,
    /// `busy` replies tolerated per transmission
    pub max_busy: u8,
    /// `mac join otaa` attempts per OTAA join
    pub otaa_join_attempts: u8,
    /// Application port used for uplinks
    pub tx_port: u8,
    /// Wake-up attempts made by autobaud
    pub autobaud_attempts: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 2_000,
            network_timeout_ms: 30_000,
            command_delay_ms: 100,
            settle_delay_ms: 1_000,
            retry_delay_ms: 1_000,
            max_tx_attempts: 10,
            max_busy: 10,
            otaa_join_attempts: 2,
            tx_port: 1,
            autobaud_attempts: 10,
        }
    }
}
