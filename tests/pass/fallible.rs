use callable_journal::journal;
use std::num::ParseIntError;

#[journal(result_names = "port")]
fn parse_port(raw: &str) -> Result<u16, ParseIntError> {
    let port = raw.trim().parse::<u16>()?;
    Ok(port)
}

#[journal]
fn checked(value: i32) -> std::io::Result<i32> {
    if value < 0 {
        return Err(std::io::Error::other("negative"));
    }
    Ok(value)
}

fn main() {
    assert_eq!(parse_port("8080"), Ok(8080));
    assert!(parse_port("http").is_err());
    assert!(checked(-1).is_err());
    assert_eq!(checked(3).unwrap(), 3);
}
