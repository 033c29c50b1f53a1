//! The parameters a user can change while the simulation is running.
//!
//! Every value is clamped into its range whenever it changes, so the rest of the engine never
//! has to worry about, say, a negative mass.

/// Which law of gravity to integrate particles with.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ModelKind {
    /// The pseudo-Newtonian potential that has a real event horizon.
    #[default]
    PaczynskiWiita,
    /// Softened inverse-square gravity with no horizon.
    Newtonian,
}

impl ModelKind {
    /// The other model.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::PaczynskiWiita => Self::Newtonian,
            Self::Newtonian => Self::PaczynskiWiita,
        }
    }

    /// Short human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PaczynskiWiita => "Paczyński–Wiita",
            Self::Newtonian => "Newtonian",
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().replace('-', "_").as_str() {
            "paczynski_wiita" | "pw" => Ok(Self::PaczynskiWiita),
            "newtonian" | "newton" => Ok(Self::Newtonian),
            _ => Err(format!(
                "Unknown gravity model '{input}', expected 'paczynski-wiita' or 'newtonian'"
            )),
        }
    }
}

/// The 4 numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Parameter {
    /// Mass of the attractor.
    Mass,
    /// The user-facing gravitational constant.
    GravitationalConstant,
    /// Distance between lines of the reference grid.
    GridSpacing,
    /// Simulation speed multiplier.
    TimeScale,
}

impl Parameter {
    /// The inclusive range of allowed values.
    #[must_use]
    pub const fn range(self) -> (f32, f32) {
        match self {
            Self::Mass => (1.0, 20.0),
            Self::GravitationalConstant => (0.1, 3.0),
            Self::GridSpacing => (15.0, 80.0),
            Self::TimeScale => (0.0, 3.0),
        }
    }

    /// Clamp a value into this parameter's range.
    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

/// A single change to the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum ParameterUpdate {
    /// Set a parameter to an absolute value.
    Set(Parameter, f32),
    /// Add a (possibly negative) amount to a parameter.
    Nudge(Parameter, f32),
    /// Use a specific gravity model.
    SetModel(ModelKind),
    /// Switch to the other gravity model.
    ToggleModel,
}

/// Everything a user can tweak live.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Parameters {
    /// Mass of the attractor, `M`.
    pub mass: f32,
    /// The user-facing gravitational constant, `G`.
    pub gravitational_constant: f32,
    /// Distance between lines of the reference grid in world units.
    pub grid_spacing: f32,
    /// Multiplier on the per-frame time step.
    pub time_scale: f32,
    /// The law of gravity.
    pub model: ModelKind,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            mass: 4.0,
            gravitational_constant: 0.8,
            grid_spacing: 30.0,
            time_scale: 1.0,
            model: ModelKind::default(),
        }
    }
}

impl Parameters {
    /// Get the current value of a numeric parameter.
    #[must_use]
    pub const fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Mass => self.mass,
            Parameter::GravitationalConstant => self.gravitational_constant,
            Parameter::GridSpacing => self.grid_spacing,
            Parameter::TimeScale => self.time_scale,
        }
    }

    /// Set a numeric parameter, clamped to its range. Non-finite values are ignored.
    pub fn set(&mut self, parameter: Parameter, value: f32) {
        if !value.is_finite() {
            tracing::warn!("Ignoring non-finite value for {parameter:?}");
            return;
        }

        let clamped = parameter.clamp(value);
        match parameter {
            Parameter::Mass => self.mass = clamped,
            Parameter::GravitationalConstant => self.gravitational_constant = clamped,
            Parameter::GridSpacing => self.grid_spacing = clamped,
            Parameter::TimeScale => self.time_scale = clamped,
        }
    }

    /// Apply a single update.
    pub fn apply(&mut self, update: ParameterUpdate) {
        match update {
            ParameterUpdate::Set(parameter, value) => self.set(parameter, value),
            ParameterUpdate::Nudge(parameter, amount) => {
                self.set(parameter, self.get(parameter) + amount);
            }
            ParameterUpdate::SetModel(model) => self.model = model,
            ParameterUpdate::ToggleModel => self.model = self.model.toggled(),
        }
    }

    /// A copy with every value forced into its range. Non-finite values are reset to defaults.
    #[must_use]
    pub fn clamped(self) -> Self {
        let mut clamped = Self {
            model: self.model,
            ..Self::default()
        };
        for parameter in [
            Parameter::Mass,
            Parameter::GravitationalConstant,
            Parameter::GridSpacing,
            Parameter::TimeScale,
        ] {
            clamped.set(parameter, self.get(parameter));
        }
        clamped
    }

    /// `G * M` with `G` brought into world units.
    #[must_use]
    pub fn gm(&self, g_scale: f32) -> f32 {
        self.gravitational_constant * g_scale * self.mass
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_clamps_to_range() {
        let mut parameters = Parameters::default();
        parameters.set(Parameter::Mass, 100.0);
        assert!((parameters.mass - 20.0).abs() < f32::EPSILON);
        parameters.set(Parameter::TimeScale, -1.0);
        assert!(parameters.time_scale.abs() < f32::EPSILON);
    }

    #[test]
    fn nudge_accumulates() {
        let mut parameters = Parameters::default();
        parameters.apply(ParameterUpdate::Nudge(Parameter::GridSpacing, 5.0));
        parameters.apply(ParameterUpdate::Nudge(Parameter::GridSpacing, 5.0));
        assert!((parameters.grid_spacing - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn nan_is_ignored() {
        let mut parameters = Parameters::default();
        parameters.apply(ParameterUpdate::Set(Parameter::GravitationalConstant, f32::NAN));
        assert!((parameters.gravitational_constant - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn toggling_model() {
        let mut parameters = Parameters::default();
        parameters.apply(ParameterUpdate::ToggleModel);
        assert_eq!(parameters.model, ModelKind::Newtonian);
        parameters.apply(ParameterUpdate::ToggleModel);
        assert_eq!(parameters.model, ModelKind::PaczynskiWiita);
    }

    #[test]
    fn clamped_resets_non_finite() {
        let parameters = Parameters {
            mass: f32::INFINITY,
            gravitational_constant: 10.0,
            ..Parameters::default()
        }
        .clamped();
        assert!((parameters.mass - 4.0).abs() < f32::EPSILON);
        assert!((parameters.gravitational_constant - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parsing_model_names() {
        assert_eq!(
            "paczynski-wiita".parse::<ModelKind>().unwrap(),
            ModelKind::PaczynskiWiita
        );
        assert_eq!("Newtonian".parse::<ModelKind>().unwrap(), ModelKind::Newtonian);
        assert!("einstein".parse::<ModelKind>().is_err());
    }

    #[test]
    fn default_gm() {
        let parameters = Parameters::default();
        assert!((parameters.gm(1000.0) - 3200.0).abs() < 0.01);
    }
}
