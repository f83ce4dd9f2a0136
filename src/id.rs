use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic document-ID generator shared by every collection.
/// IDs have the form `<prefix>_<n>`; no two IDs from one generator share `n`.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    /// Seed from the wall clock (milliseconds) so IDs from separate runs do not collide.
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(1);
        Self::starting_from(millis)
    }

    pub fn next_id(&mut self, prefix: &str) -> String {
        let id = self.next;
        self.next += 1;
        format!("{prefix}_{id}")
    }

    /// Next id for which `taken` is false. Generators from separate runs may
    /// overlap; this skips ids already in use.
    pub fn next_free_id(&mut self, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.next_id(prefix);
            if !taken(&id) {
                return id;
            }
        }
    }
}

/// Clock-seeded; use [`IdGenerator::new`] for reproducible ids.
impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_clock()
    }
}
