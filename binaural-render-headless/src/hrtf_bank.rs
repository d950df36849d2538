use binaural_render_core::traits::hrtf_bank::HrtfBank;

/// An `HrtfBank` over a fixed list of SOFA file names.
#[derive(Debug, Clone, Default)]
pub struct StaticHrtfBank {
    names: Vec<String>,
    active: usize,
}

impl StaticHrtfBank {
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            active: 0,
        }
    }

    /// `mic_<pair>.sofa` far-field profiles followed by two
    /// `config_<u>_mic_<pair>.sofa` profiles per user.
    pub fn with_users(far_field: usize, users: usize) -> Self {
        let mut names: Vec<String> = (0..far_field)
            .map(|i| format!("mic_{}{}.sofa", i / 10, i % 10))
            .collect();
        for user in 0..users {
            names.push(format!("config_{}_mic_{}1.sofa", user, user % 10));
            names.push(format!("config_{}_mic_{}2.sofa", user, user % 10));
        }
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl HrtfBank for StaticHrtfBank {
    fn count(&self) -> usize {
        self.names.len()
    }

    fn name(&self, index: usize) -> Option<String> {
        self.names.get(index).cloned()
    }

    fn active_index(&self) -> usize {
        self.active
    }

    fn set_active(&mut self, index: usize) {
        if index >= self.names.len() && !self.names.is_empty() {
            log::warn!("HRTF index {} out of range ({} loaded)", index, self.names.len());
        }
        self.active = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names() {
        let bank = StaticHrtfBank::with_users(3, 2);
        assert_eq!(bank.count(), 7);
        assert_eq!(bank.name(2).as_deref(), Some("mic_02.sofa"));
        assert_eq!(bank.user_config_indices(1), vec![5, 6]);
        assert_eq!(bank.name(5).as_deref(), Some("config_1_mic_11.sofa"));
        assert_eq!(bank.far_field_indices(), vec![0, 1, 2]);
        assert!(bank.is_last(2));
    }

    #[test]
    fn active_selection() {
        let mut bank = StaticHrtfBank::new(["a.sofa", "b.sofa"]);
        assert_eq!(bank.active_name().as_deref(), Some("a.sofa"));
        bank.set_active(1);
        assert_eq!(bank.active_index(), 1);
        assert!(bank.is_last(bank.active_index()));
    }
}
