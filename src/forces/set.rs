//! Named, individually toggleable forces kept in application order.

use serde::{Deserialize, Serialize};

use super::params::{ForceKind, ForceParams};
use crate::error::ConfigurationError;

fn enabled_by_default() -> bool {
    true
}

/// One registered force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedForce {
    pub name: String,
    pub params: ForceParams,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// Ordered set of named forces.
///
/// Forces are stored sorted by kind (many-body, link, collide, x, y, center)
/// and by registration order within a kind, so iteration order is the
/// application order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NamedForce>", into = "Vec<NamedForce>")]
pub struct ForceSet {
    forces: Vec<NamedForce>,
}

impl ForceSet {
    /// A set with no forces.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `manyBody`, `link` and `center` enabled; `collide`, `x` and `y`
    /// registered but disabled.
    pub fn standard() -> Self {
        let mut set = Self::empty();
        for (kind, enabled) in [
            (ForceKind::ManyBody, true),
            (ForceKind::Link, true),
            (ForceKind::Collide, false),
            (ForceKind::X, false),
            (ForceKind::Y, false),
            (ForceKind::Center, true),
        ] {
            set.insert(NamedForce {
                name: kind.name().to_string(),
                params: ForceParams::default_for(kind),
                enabled,
            });
        }
        set
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(
        mut self,
        name: impl Into<String>,
        params: ForceParams,
    ) -> Result<Self, ConfigurationError> {
        self.register(name, params, true)?;
        Ok(self)
    }

    /// Add a new named force.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        params: ForceParams,
        enabled: bool,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        self.check_new(&name, &params)?;
        self.insert(NamedForce {
            name,
            params,
            enabled,
        });
        Ok(())
    }

    /// Replace the parameters of an existing force. The kind cannot change.
    pub fn configure(&mut self, name: &str, params: ForceParams) -> Result<(), ConfigurationError> {
        let force = self.find(name)?;
        let expected = force.params.kind();
        if params.kind() != expected {
            return Err(ConfigurationError::ForceKindMismatch {
                name: name.to_string(),
                expected: expected.name(),
                found: params.kind().name(),
            });
        }
        params.validate()?;
        self.find_mut(name)?.params = params;
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ConfigurationError> {
        self.find_mut(name)?.enabled = enabled;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamedForce> {
        self.forces.iter().find(|force| force.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All forces in application order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedForce> {
        self.forces.iter()
    }

    /// Enabled forces in application order.
    pub fn enabled(&self) -> impl Iterator<Item = &NamedForce> {
        self.forces.iter().filter(|force| force.enabled)
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Re-check every force's parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.forces.iter().try_for_each(|force| force.params.validate())
    }

    fn check_new(&self, name: &str, params: &ForceParams) -> Result<(), ConfigurationError> {
        if self.contains(name) {
            return Err(ConfigurationError::DuplicateForce(name.to_string()));
        }
        params.validate()
    }

    fn insert(&mut self, force: NamedForce) {
        let kind = force.params.kind();
        let at = self.forces.partition_point(|f| f.params.kind() <= kind);
        self.forces.insert(at, force);
    }

    fn find(&self, name: &str) -> Result<&NamedForce, ConfigurationError> {
        self.get(name)
            .ok_or_else(|| ConfigurationError::UnknownForce(name.to_string()))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut NamedForce, ConfigurationError> {
        self.forces
            .iter_mut()
            .find(|force| force.name == name)
            .ok_or_else(|| ConfigurationError::UnknownForce(name.to_string()))
    }
}

impl TryFrom<Vec<NamedForce>> for ForceSet {
    type Error = ConfigurationError;

    fn try_from(forces: Vec<NamedForce>) -> Result<Self, Self::Error> {
        let mut set = Self::empty();
        for force in forces {
            set.register(force.name, force.params, force.enabled)?;
        }
        Ok(set)
    }
}

impl From<ForceSet> for Vec<NamedForce> {
    fn from(set: ForceSet) -> Self {
        set.forces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::params::{AxisParams, CenterParams, LinkParams, ManyBodyParams};

    fn names(set: &ForceSet) -> Vec<&str> {
        set.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_standard_set() {
        let set = ForceSet::standard();
        assert_eq!(names(&set), ["manyBody", "link", "collide", "x", "y", "center"]);
        let enabled: Vec<&str> = set.enabled().map(|f| f.name.as_str()).collect();
        assert_eq!(enabled, ["manyBody", "link", "center"]);
    }

    #[test]
    fn test_order_by_kind_then_registration() {
        let mut set = ForceSet::empty();
        set.register("middle", ForceParams::Center(CenterParams::default()), true)
            .unwrap();
        set.register("columns", ForceParams::X(AxisParams::new(100.0, 0.2)), true)
            .unwrap();
        set.register("charge", ForceParams::ManyBody(ManyBodyParams::default()), true)
            .unwrap();
        set.register("rows", ForceParams::X(AxisParams::new(0.0, 0.1)), true)
            .unwrap();
        assert_eq!(names(&set), ["charge", "columns", "rows", "middle"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut set = ForceSet::standard();
        let err = set
            .register("link", ForceParams::Link(LinkParams::default()), true)
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateForce("link".into()));
        assert_eq!(set, ForceSet::standard());
    }

    #[test]
    fn test_configure() {
        let mut set = ForceSet::standard();
        let params = ForceParams::ManyBody(ManyBodyParams {
            strength: -100.0,
            ..ManyBodyParams::default()
        });
        set.configure("manyBody", params.clone()).unwrap();
        assert_eq!(set.get("manyBody").unwrap().params, params);

        assert_eq!(
            set.configure("spin", params.clone()).unwrap_err(),
            ConfigurationError::UnknownForce("spin".into())
        );
        assert!(matches!(
            set.configure("link", params).unwrap_err(),
            ConfigurationError::ForceKindMismatch { expected: "link", found: "manyBody", .. }
        ));

        let invalid = ForceParams::Link(LinkParams {
            distance: -1.0,
            ..LinkParams::default()
        });
        let before = set.clone();
        assert!(set.configure("link", invalid).is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn test_enable_unknown() {
        let mut set = ForceSet::standard();
        set.set_enabled("collide", true).unwrap();
        assert!(set.get("collide").unwrap().enabled);
        assert!(set.set_enabled("gravity", true).is_err());
    }

    #[test]
    fn test_json_sorts_and_rejects_duplicates() {
        let set: ForceSet = serde_json::from_str(
            r#"[
                {"name": "center", "params": {"kind": "center"}},
                {"name": "charge", "params": {"kind": "manyBody", "strength": -10}, "enabled": false}
            ]"#,
        )
        .unwrap();
        assert_eq!(names(&set), ["charge", "center"]);
        assert!(!set.get("charge").unwrap().enabled);

        let duplicate = serde_json::from_str::<ForceSet>(
            r#"[{"name": "a", "params": {"kind": "center"}}, {"name": "a", "params": {"kind": "link"}}]"#,
        );
        assert!(duplicate.is_err());
    }
}
