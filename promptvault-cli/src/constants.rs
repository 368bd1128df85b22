/// App name used for the confy config file and the binary.
pub const PVAULT_CLI: &str = "pvault";

/// Overrides the configured service URL. Also read from a `.env` file.
pub const API_URL_ENV: &str = "PROMPTVAULT_API_URL";
