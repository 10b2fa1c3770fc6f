//! Shared regex patterns for catalog schemas

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Weekday names accepted by the schedule records
    pub static ref WEEKDAY_REGEX: Regex = Regex::new(
        r"(?i)^(lunes|martes|miércoles|miercoles|jueves|viernes|sábado|sabado|domingo)$"
    )
    .unwrap();

    /// 24h clock time, HH:MM
    pub static ref TIME_REGEX: Regex = Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap();

    /// Professional license number: 4 to 10 digits
    pub static ref LICENSE_REGEX: Regex = Regex::new(r"^[0-9]{4,10}$").unwrap();

    /// Usernames: letters, digits, dot, underscore, hyphen
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._-]{3,32}$").unwrap();
}
