//! Issuer identification number lookup table (§4.1).
//!
//! Ported from the `ISSUERS` table in the AAMVA reference decoder this
//! crate is modeled on.

use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    static ref ISSUERS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("636033", "Alabama");
        m.insert("646059", "Alaska");
        m.insert("604427", "American Samoa");
        m.insert("604430", "Northern Marianna Islands");
        m.insert("604433", "Nunavut");
        m.insert("636026", "Arizona");
        m.insert("636021", "Arkansas");
        m.insert("636028", "British Columbia");
        m.insert("636014", "California");
        m.insert("636056", "Caohulia");
        m.insert("636020", "Colorado");
        m.insert("636006", "Connecticut");
        m.insert("636043", "District of Columbia");
        m.insert("636011", "Delaware");
        m.insert("636010", "Florida");
        m.insert("636055", "Georgia");
        m.insert("636019", "Guam");
        m.insert("636047", "Hawaii");
        m.insert("636057", "Hidalgo");
        m.insert("636050", "Idaho");
        m.insert("636035", "Illinois");
        m.insert("636037", "Indiana");
        m.insert("636018", "Iowa");
        m.insert("636022", "Kansas");
        m.insert("636046", "Kentucky");
        m.insert("636007", "Louisiana");
        m.insert("636041", "Maine");
        m.insert("636048", "Manitoba");
        m.insert("636003", "Maryland");
        m.insert("636002", "Massachusetts");
        m.insert("636032", "Michigan");
        m.insert("636038", "Minnesota");
        m.insert("636051", "Mississippi");
        m.insert("636030", "Missouri");
        m.insert("636008", "Montana");
        m.insert("636054", "Nebraska");
        m.insert("636049", "Nevada");
        m.insert("636017", "New Brunswick");
        m.insert("636039", "New Hampshire");
        m.insert("636036", "New Jersey");
        m.insert("636009", "New Mexico");
        m.insert("636001", "New York");
        m.insert("636016", "Newfoundland");
        m.insert("636004", "North Carolina");
        m.insert("636034", "North Dakota");
        m.insert("636013", "Nova Scotia");
        m.insert("636023", "Ohio");
        m.insert("636058", "Oklahoma");
        m.insert("636012", "Ontario");
        m.insert("636029", "Oregon");
        m.insert("636025", "Pennsylvania");
        m.insert("604426", "Prince Edward Island");
        m.insert("604428", "Quebec");
        m.insert("636052", "Rhode Island");
        m.insert("636044", "Saskatchewan");
        m.insert("636005", "South Carolina");
        m.insert("636042", "South Dakota");
        m.insert("636053", "Tennessee");
        m.insert("636027", "State Department (USA)");
        m.insert("636015", "Texas");
        m.insert("636062", "US Virgin Islands");
        m.insert("636040", "Utah");
        m.insert("636024", "Vermont");
        m.insert("636000", "Virginia");
        m.insert("636045", "Washington");
        m.insert("636061", "West Virginia");
        m.insert("636031", "Wisconsin");
        m.insert("636060", "Wyoming");
        m.insert("604429", "Yukon");
        m
    };
}

/// Looks up the issuing jurisdiction for a 6-digit IIN, if known (§4.1).
pub fn issuer_name(iin: &str) -> Option<&'static str> {
    ISSUERS.get(iin).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_iin_resolves() {
        assert_eq!(issuer_name("636015"), Some("Texas"));
        assert_eq!(issuer_name("636005"), Some("South Carolina"));
    }

    #[test]
    fn unknown_iin_is_none() {
        assert_eq!(issuer_name("999999"), None);
    }
}
