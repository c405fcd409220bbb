//! AI personality: named scalars sampled lazily from declared ranges
//!
//! Each instinct is drawn once, the first time the agent consults it, and is
//! stable for the agent's lifetime. Ranges come from built-in defaults or
//! from a TOML personality file in `data/instincts/{name}.toml`.

use ahash::AHashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use serde::Deserialize;
use std::path::PathBuf;

use crate::catalog::WeightClass;
use crate::core::error::{BattleError, Result};

/// The personality knobs the decision policies consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instinct {
    /// Overall eagerness to shoot rather than maneuver
    Aggression,
    /// Weight on vulnerability when scoring move candidates
    Caution,
    /// Weight on opportunity when scoring move candidates
    Opportunism,
    /// Priority bump toward ships that hurt us
    Anger,
    /// Priority bump toward ships that destroy ours
    Grudge,
    /// Exponent smoothing the priority signal in attack scoring
    Focus,
    /// Chance to go looking for a boarding action instead of shooting
    BoardingZeal,
    /// Bias toward finishing off already-damaged targets
    PreyOnWeak,
    PreferEscorts,
    PreferDestroyers,
    PreferCruisers,
    PreferBattleships,
    PreferDreadnoughts,
}

impl Instinct {
    pub const ALL: [Instinct; 13] = [
        Instinct::Aggression,
        Instinct::Caution,
        Instinct::Opportunism,
        Instinct::Anger,
        Instinct::Grudge,
        Instinct::Focus,
        Instinct::BoardingZeal,
        Instinct::PreyOnWeak,
        Instinct::PreferEscorts,
        Instinct::PreferDestroyers,
        Instinct::PreferCruisers,
        Instinct::PreferBattleships,
        Instinct::PreferDreadnoughts,
    ];

    /// Default sampling range when no personality file overrides it
    pub fn default_range(self) -> (f64, f64) {
        match self {
            Instinct::Aggression => (0.3, 0.9),
            Instinct::Caution => (0.2, 0.8),
            Instinct::Opportunism => (0.5, 1.2),
            Instinct::Anger => (0.1, 0.6),
            Instinct::Grudge => (0.2, 1.0),
            Instinct::Focus => (0.5, 1.5),
            Instinct::BoardingZeal => (0.02, 0.15),
            Instinct::PreyOnWeak => (0.2, 1.0),
            Instinct::PreferEscorts
            | Instinct::PreferDestroyers
            | Instinct::PreferCruisers
            | Instinct::PreferBattleships
            | Instinct::PreferDreadnoughts => (0.5, 1.5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Instinct::Aggression => "aggression",
            Instinct::Caution => "caution",
            Instinct::Opportunism => "opportunism",
            Instinct::Anger => "anger",
            Instinct::Grudge => "grudge",
            Instinct::Focus => "focus",
            Instinct::BoardingZeal => "boarding_zeal",
            Instinct::PreyOnWeak => "prey_on_weak",
            Instinct::PreferEscorts => "prefer_escorts",
            Instinct::PreferDestroyers => "prefer_destroyers",
            Instinct::PreferCruisers => "prefer_cruisers",
            Instinct::PreferBattleships => "prefer_battleships",
            Instinct::PreferDreadnoughts => "prefer_dreadnoughts",
        }
    }

    fn from_name(name: &str) -> Option<Instinct> {
        Instinct::ALL.into_iter().find(|i| i.name() == name)
    }

    /// The deploy-preference instinct for a weight class
    pub fn for_weight_class(class: WeightClass) -> Instinct {
        match class {
            WeightClass::Escort => Instinct::PreferEscorts,
            WeightClass::Destroyer => Instinct::PreferDestroyers,
            WeightClass::Cruiser => Instinct::PreferCruisers,
            WeightClass::Battleship => Instinct::PreferBattleships,
            WeightClass::Dreadnought => Instinct::PreferDreadnoughts,
        }
    }
}

/// On-disk personality format
#[derive(Debug, Deserialize)]
struct PersonalityFile {
    #[serde(default)]
    ranges: std::collections::HashMap<String, [f64; 2]>,
}

/// A fixed personality: ranges plus the values already drawn from them
#[derive(Debug, Clone)]
pub struct Instincts {
    name: String,
    ranges: AHashMap<Instinct, (f64, f64)>,
    sampled: AHashMap<Instinct, f64>,
    rng: ChaCha8Rng,
}

impl Instincts {
    /// Built-in default personality
    pub fn new(seed: u64) -> Self {
        let ranges = Instinct::ALL
            .into_iter()
            .map(|i| (i, i.default_range()))
            .collect();
        Self {
            name: "default".into(),
            ranges,
            sampled: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Load range overrides from `data/instincts/{name}.toml`
    pub fn load(name: &str, seed: u64) -> Result<Self> {
        let path = PathBuf::from("data/instincts").join(format!("{}.toml", name));
        let contents = std::fs::read_to_string(&path)?;
        let file: PersonalityFile = toml::from_str(&contents)
            .map_err(|e| BattleError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let mut instincts = Self::new(seed);
        instincts.name = name.to_string();
        for (key, [lo, hi]) in file.ranges {
            let instinct = Instinct::from_name(&key).ok_or_else(|| {
                BattleError::ConfigError(format!("unknown instinct '{}'", key))
            })?;
            if lo > hi {
                return Err(BattleError::ConfigError(format!(
                    "empty range for '{}'",
                    key
                )));
            }
            instincts.ranges.insert(instinct, (lo, hi));
        }
        Ok(instincts)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample on first use, then stay stable for the agent's lifetime
    pub fn get(&mut self, instinct: Instinct) -> f64 {
        if let Some(&value) = self.sampled.get(&instinct) {
            return value;
        }
        let (lo, hi) = self.ranges[&instinct];
        let value = if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        };
        self.sampled.insert(instinct, value);
        value
    }

    pub fn weight_preference(&mut self, class: WeightClass) -> f64 {
        self.get(Instinct::for_weight_class(class))
    }
}
