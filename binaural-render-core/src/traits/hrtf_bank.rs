/// The set of interchangeable HRTF (SOFA) profiles the renderer can apply.
///
/// Indices run over `0..count()`. Names carrying a `config_<user>` tag are
/// near-field user profiles; every other name is a far-field profile cycled
/// by the room and all-at-once passes.
pub trait HrtfBank {
    fn count(&self) -> usize;

    /// File name of the configuration at `index`, if it exists.
    fn name(&self, index: usize) -> Option<String>;

    fn active_index(&self) -> usize;

    fn set_active(&mut self, index: usize);

    fn active_name(&self) -> Option<String> {
        self.name(self.active_index())
    }

    /// Far-field profiles in bank order.
    fn far_field_indices(&self) -> Vec<usize> {
        (0..self.count())
            .filter(|&i| self.name(i).is_some_and(|name| !has_any_config_tag(&name)))
            .collect()
    }

    /// Whether `index` is the final far-field configuration.
    ///
    /// Uses `>=` so an index past the end also counts as last.
    fn is_last(&self, index: usize) -> bool {
        self.far_field_indices().last().is_none_or(|&last| index >= last)
    }

    /// Indices whose name carries `config_<user>`, in bank order.
    ///
    /// `config_1` does not match `config_10`.
    fn user_config_indices(&self, user: usize) -> Vec<usize> {
        let needle = format!("config_{}", user);
        (0..self.count())
            .filter(|&i| {
                self.name(i)
                    .map(|name| contains_config_tag(&name, &needle))
                    .unwrap_or(false)
            })
            .collect()
    }
}

fn contains_config_tag(name: &str, needle: &str) -> bool {
    name.match_indices(needle).any(|(start, matched)| {
        !name[start + matched.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

fn has_any_config_tag(name: &str) -> bool {
    name.match_indices("config_").any(|(start, matched)| {
        name[start + matched.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Names(Vec<&'static str>, usize);

    impl HrtfBank for Names {
        fn count(&self) -> usize {
            self.0.len()
        }
        fn name(&self, index: usize) -> Option<String> {
            self.0.get(index).map(|s| s.to_string())
        }
        fn active_index(&self) -> usize {
            self.1
        }
        fn set_active(&mut self, index: usize) {
            self.1 = index;
        }
    }

    #[test]
    fn last_is_count_minus_one() {
        let bank = Names(vec!["a", "b", "c"], 0);
        assert!(!bank.is_last(1));
        assert!(bank.is_last(2));
        assert!(bank.is_last(7));
    }

    #[test]
    fn far_field_skips_user_profiles() {
        let bank = Names(
            vec![
                "config_0_mic_01.sofa",
                "mic_12.sofa",
                "config_1_mic_11.sofa",
                "mic_34.sofa",
                "config_room.sofa",
                "config_2_mic_21.sofa",
            ],
            0,
        );
        assert_eq!(bank.far_field_indices(), vec![1, 3, 4]);
        assert!(!bank.is_last(3));
        assert!(bank.is_last(4));
        assert!(bank.is_last(5));
    }

    #[test]
    fn user_configs_do_not_match_longer_numbers() {
        let bank = Names(
            vec![
                "mic_12.sofa",
                "config_1_mic_34.sofa",
                "config_10_mic_56.sofa",
                "config_1_mic_78.sofa",
            ],
            0,
        );
        assert_eq!(bank.user_config_indices(1), vec![1, 3]);
        assert_eq!(bank.user_config_indices(10), vec![2]);
        assert!(bank.user_config_indices(4).is_empty());
    }

    #[test]
    fn active_name_follows_index() {
        let mut bank = Names(vec!["a.sofa", "b.sofa"], 0);
        bank.set_active(1);
        assert_eq!(bank.active_name().as_deref(), Some("b.sofa"));
        bank.set_active(9);
        assert_eq!(bank.active_name(), None);
    }
}
