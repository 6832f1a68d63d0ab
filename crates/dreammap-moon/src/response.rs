use serde::Deserialize;

/// Shape of the astronomy API reply. Every level is optional so that a
/// partial reply still decodes and can be walked safely.
#[derive(Debug, Default, Deserialize)]
pub struct AstronomyResponse {
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub astronomy: Option<Astronomy>,
}

#[derive(Debug, Deserialize)]
pub struct Astronomy {
    #[serde(default)]
    pub objects: Option<Vec<AstronomyObject>>,
}

#[derive(Debug, Deserialize)]
pub struct AstronomyObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub days: Option<Vec<Day>>,
}

#[derive(Debug, Deserialize)]
pub struct Day {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub moonphase: Option<String>,
}

impl AstronomyResponse {
    /// `locations[0].astronomy.objects[name == "moon"].days[0].moonphase`,
    /// with the object name compared case-insensitively.
    pub fn moon_phase_code(&self) -> Option<&str> {
        self.locations
            .as_ref()?
            .first()?
            .astronomy
            .as_ref()?
            .objects
            .as_ref()?
            .iter()
            .find(|o| {
                o.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case("moon"))
            })?
            .days
            .as_ref()?
            .first()?
            .moonphase
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }
}
