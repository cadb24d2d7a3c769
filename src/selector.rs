use crate::model::{CountryOption, Scope};

/// Label of the pseudo-option the selector prepends
pub const WORLDWIDE_LABEL: &str = "Worldwide";

/// Country picker popup state: filter text and highlighted row
#[derive(Clone, Debug, Default)]
pub struct CountrySelector {
    pub filter: String,
    pub cursor: usize,
}

/// One visible row of the popup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice<'a> {
    pub label: &'a str,
    pub scope: Scope,
}

impl CountrySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worldwide first, then every option whose name or code contains the
    /// filter (case-insensitive). Worldwide is itself subject to the filter.
    pub fn choices<'a>(&self, options: &'a [CountryOption]) -> Vec<Choice<'a>> {
        let needle = self.filter.trim().to_lowercase();
        let matches = |text: &str| needle.is_empty() || text.to_lowercase().contains(&needle);

        let worldwide = matches(WORLDWIDE_LABEL).then(|| Choice {
            label: WORLDWIDE_LABEL,
            scope: Scope::Worldwide,
        });

        worldwide
            .into_iter()
            .chain(
                options
                    .iter()
                    .filter(|opt| matches(opt.name.as_str()) || matches(opt.value.as_str()))
                    .map(|opt| Choice {
                        label: opt.name.as_str(),
                        scope: Scope::Country(opt.value.clone()),
                    }),
            )
            .collect()
    }

    /// Scope under the cursor, if anything matches
    pub fn current(&self, options: &[CountryOption]) -> Option<Scope> {
        let choices = self.choices(options);
        let idx = self.cursor.min(choices.len().checked_sub(1)?);
        choices.into_iter().nth(idx).map(|c| c.scope)
    }

    pub fn push_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.cursor = 0;
    }

    pub fn pop_char(&mut self) {
        self.filter.pop();
        self.cursor = 0;
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, options: &[CountryOption]) {
        let len = self.choices(options).len();
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Move by a page, clamped to the choice list
    pub fn page(&mut self, options: &[CountryOption], delta: isize) {
        let len = self.choices(options).len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<CountryOption> {
        [("France", "FR"), ("Germany", "DE"), ("Finland", "FI")]
            .into_iter()
            .map(|(name, value)| CountryOption { name: name.into(), value: value.into() })
            .collect()
    }

    #[test]
    fn worldwide_is_prepended() {
        let opts = options();
        let choices = CountrySelector::new().choices(&opts);
        assert_eq!(choices.len(), 4);
        assert_eq!(choices[0].scope, Scope::Worldwide);
        assert_eq!(choices[1].label, "France");
    }

    #[test]
    fn filter_matches_name_or_code() {
        let opts = options();
        let mut sel = CountrySelector::new();
        sel.push_char('f');
        let labels: Vec<_> = sel.choices(&opts).iter().map(|c| c.label).collect();
        assert_eq!(labels, ["France", "Finland"]);

        sel.filter = "ger".into();
        assert_eq!(sel.current(&opts), Some(Scope::Country("DE".into())));

        // "worldwide" ends in "de", so the code filter also keeps it
        sel.filter = "DE".into();
        let labels: Vec<_> = sel.choices(&opts).iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Worldwide", "Germany"]);

        sel.filter = "world".into();
        assert_eq!(sel.current(&opts), Some(Scope::Worldwide));
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let opts = options();
        let mut sel = CountrySelector::new();
        sel.move_up();
        assert_eq!(sel.cursor, 0);
        for _ in 0..10 {
            sel.move_down(&opts);
        }
        assert_eq!(sel.cursor, 3);
        assert_eq!(sel.current(&opts), Some(Scope::Country("FI".into())));

        sel.page(&opts, -100);
        assert_eq!(sel.cursor, 0);
        sel.page(&opts, 100);
        assert_eq!(sel.cursor, 3);
    }

    #[test]
    fn no_match_has_no_current() {
        let opts = options();
        let mut sel = CountrySelector::new();
        sel.filter = "zzz".into();
        assert!(sel.choices(&opts).is_empty());
        assert_eq!(sel.current(&opts), None);
        sel.page(&opts, 5);
        assert_eq!(sel.cursor, 0);
    }

    #[test]
    fn typing_resets_cursor() {
        let opts = options();
        let mut sel = CountrySelector::new();
        sel.move_down(&opts);
        sel.move_down(&opts);
        sel.push_char('g');
        assert_eq!(sel.cursor, 0);
        sel.pop_char();
        assert!(sel.filter.is_empty());
    }
}
