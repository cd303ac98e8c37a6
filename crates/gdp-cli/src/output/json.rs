use gdp_core::error::GdpError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), GdpError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
