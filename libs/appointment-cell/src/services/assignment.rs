use crate::models::AssignmentStrategy;

/// Returns the id with the smallest count. When several share the minimum,
/// the first one in iteration order wins.
pub fn least_loaded<'a, I>(loads: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut best: Option<(&'a str, usize)> = None;

    for (doctor_id, count) in loads {
        match best {
            Some((_, lowest)) if lowest <= count => {}
            _ => best = Some((doctor_id, count)),
        }
    }

    best.map(|(doctor_id, _)| doctor_id)
}

/// Anyone present selects the session-count strategy; an empty set falls
/// back to persisted totals.
pub fn choose_strategy(available: &[String]) -> AssignmentStrategy {
    if available.is_empty() {
        AssignmentStrategy::Overall
    } else {
        AssignmentStrategy::Local
    }
}

/// Patients assigned per doctor since process start, in registry order.
///
/// Only the local strategy moves these counters. They are deliberately not
/// reconciled with the persisted totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCounters {
    counts: Vec<(String, usize)>,
}

impl SessionCounters {
    pub fn new<'a, I>(doctor_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            counts: doctor_ids.into_iter().map(|id| (id.to_string(), 0)).collect(),
        }
    }

    pub fn from_counts(counts: Vec<(String, usize)>) -> Self {
        Self { counts }
    }

    pub fn get(&self, doctor_id: &str) -> usize {
        self.counts
            .iter()
            .find(|(id, _)| id == doctor_id)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Minimum over every configured doctor, not only the ones present.
    pub fn select_local(&self) -> Option<&str> {
        least_loaded(self.counts.iter().map(|(id, count)| (id.as_str(), *count)))
    }

    pub fn increment(&mut self, doctor_id: &str) {
        if let Some((_, count)) = self.counts.iter_mut().find(|(id, _)| id == doctor_id) {
            *count += 1;
        }
    }

    pub fn snapshot(&self) -> Vec<(String, usize)> {
        self.counts.clone()
    }
}
