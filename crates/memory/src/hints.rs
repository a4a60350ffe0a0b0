//! Pulling location hints out of free-form chat.

use brainstem_core::Vec3;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

const NUM: &str = r"(-?\d+(?:\.\d+)?)";

/// "x: 120 y: 70 z: -45", "x=120, y=70, z=-45", "X 120 Y 70 Z -45".
static LABELED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bx\s*[:=]?\s*{NUM}[\s,;]+y\s*[:=]?\s*{NUM}[\s,;]+z\s*[:=]?\s*{NUM}"
    ))
    .ok()
});

/// "120 70 -45", "120, 70, -45".
static BARE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!(r"{NUM}[\s,;]+{NUM}[\s,;]+{NUM}")).ok());

/// Extract the first coordinate triple mentioned in a chat message.
///
/// The labeled form wins over a bare triple when both are present.
pub fn parse_coordinates(message: &str) -> Option<Vec3> {
    [&LABELED, &BARE]
        .into_iter()
        .filter_map(|re| re.as_ref())
        .find_map(|re| re.captures(message).and_then(|caps| triple(&caps)))
}

fn triple(caps: &Captures<'_>) -> Option<Vec3> {
    let axis = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    Some(Vec3::new(axis(1)?, axis(2)?, axis(3)?))
}

/// Whether a message asks the agent to come over.
pub fn mentions_follow_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("come here") || lower.contains("follow")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        assert!(LABELED.is_some() && BARE.is_some());
    }

    #[test]
    fn labeled_triple() {
        assert_eq!(
            parse_coordinates("meet me at x: 120 y: 70 z: -45"),
            Some(Vec3::new(120.0, 70.0, -45.0))
        );
        assert_eq!(
            parse_coordinates("I'm at X=3.5, Y=64, Z=10"),
            Some(Vec3::new(3.5, 64.0, 10.0))
        );
    }

    #[test]
    fn bare_triple() {
        assert_eq!(
            parse_coordinates("base is 10, 64, -200 ok"),
            Some(Vec3::new(10.0, 64.0, -200.0))
        );
    }

    #[test]
    fn labeled_preferred_over_leading_numbers() {
        assert_eq!(
            parse_coordinates("1 2 3 no wait x 7 y 8 z 9"),
            Some(Vec3::new(7.0, 8.0, 9.0))
        );
    }

    #[test]
    fn no_triple() {
        assert_eq!(parse_coordinates("hello there"), None);
        assert_eq!(parse_coordinates("only 12 and 40"), None);
    }

    #[test]
    fn follow_request_detection() {
        assert!(mentions_follow_request("Jarvis come here!"));
        assert!(mentions_follow_request("follow me"));
        assert!(!mentions_follow_request("nice house"));
    }
}
