use crate::model::Task;

/// Aggregate progress over a snapshot. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSummary {
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`, halves rounded up; 0 for an empty list.
    pub percentage: u8,
}

impl CompletionSummary {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        let percentage = if total == 0 {
            0
        } else {
            ((200 * completed + total) / (2 * total)) as u8
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// Fraction in `[0, 1]` for drawing a progress bar.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}
