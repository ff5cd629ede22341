//! Need state: per-actor urgencies, their accrual, and relief.

use contracts::{NeedKind, Strategy};

/// One need with its current urgency (larger = more urgent) and resolution strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Need {
    pub kind: NeedKind,
    pub intensity: f64,
    /// Growth per update before scaling by the update size.
    pub accrual_rate: f64,
    pub strategy: Strategy,
}

impl Need {
    pub fn new(kind: NeedKind, intensity: f64, accrual_rate: f64) -> Self {
        Self {
            kind,
            intensity,
            accrual_rate,
            strategy: Strategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Needs in registration order. Order matters: it breaks priority ties in plans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NeedState {
    needs: Vec<Need>,
}

impl NeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a need, replacing any existing need of the same kind in place.
    pub fn insert(&mut self, need: Need) {
        match self.needs.iter_mut().find(|n| n.kind == need.kind) {
            Some(existing) => *existing = need,
            None => self.needs.push(need),
        }
    }

    pub fn with(mut self, need: Need) -> Self {
        self.insert(need);
        self
    }

    pub fn get(&self, kind: NeedKind) -> Option<&Need> {
        self.needs.iter().find(|n| n.kind == kind)
    }

    pub fn intensity(&self, kind: NeedKind) -> f64 {
        self.get(kind).map(|n| n.intensity).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.iter()
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    /// Grow every need by `accrual_rate * update_size`.
    pub fn accrue(&mut self, update_size: f64) {
        for need in &mut self.needs {
            need.intensity += need.accrual_rate * update_size;
        }
    }

    /// Lower a need by `amount`. Over-satisfied needs go negative and take longer to return.
    pub fn relieve(&mut self, kind: NeedKind, amount: f64) {
        if let Some(need) = self.needs.iter_mut().find(|n| n.kind == kind) {
            need.intensity -= amount;
        }
    }

    pub fn most_urgent(&self) -> Option<(NeedKind, f64)> {
        self.needs
            .iter()
            .fold(None, |best: Option<&Need>, need| match best {
                Some(b) if b.intensity >= need.intensity => Some(b),
                _ => Some(need),
            })
            .map(|n| (n.kind, n.intensity))
    }
}
