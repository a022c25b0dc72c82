use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    HotCold,
    Missing,
    Interval,
    OddEven,
    Zone,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::HotCold,
        Dimension::Missing,
        Dimension::Interval,
        Dimension::OddEven,
        Dimension::Zone,
    ];

    pub fn index(&self) -> usize {
        match self {
            Dimension::HotCold => 0,
            Dimension::Missing => 1,
            Dimension::Interval => 2,
            Dimension::OddEven => 3,
            Dimension::Zone => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::HotCold => "hot_cold",
            Dimension::Missing => "missing",
            Dimension::Interval => "interval",
            Dimension::OddEven => "odd_even",
            Dimension::Zone => "zone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::HotCold => "Chauds/froids",
            Dimension::Missing => "Retards",
            Dimension::Interval => "Écarts",
            Dimension::OddEven => "Pairs/impairs",
            Dimension::Zone => "Zones",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Une valeur par dimension, indexée par [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerDimension<T>(pub [T; 5]);

impl<T> PerDimension<T> {
    pub fn from_fn(mut f: impl FnMut(Dimension) -> T) -> Self {
        Self(Dimension::ALL.map(|d| f(d)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &T)> {
        Dimension::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> &[T; 5] {
        &self.0
    }
}

impl PerDimension<f64> {
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl<T> Index<Dimension> for PerDimension<T> {
    type Output = T;

    fn index(&self, dim: Dimension) -> &T {
        &self.0[dim.index()]
    }
}

impl<T> IndexMut<Dimension> for PerDimension<T> {
    fn index_mut(&mut self, dim: Dimension) -> &mut T {
        &mut self.0[dim.index()]
    }
}
