pub const SELLER_DISPLAY_VERSION: &str = env!("SELLER_DISPLAY_VERSION");
pub const SELLER_BUILD_N: &str = env!("SELLER_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "Seller Console {}\nBuild {}\nLead triage and opportunity conversion",
        SELLER_DISPLAY_VERSION, SELLER_BUILD_N
    )
}
