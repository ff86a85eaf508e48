use super::*;

/// Text inputs only; `type="time"` widgets format themselves.
pub const BASE_SELECTOR: &str = "input[type='text']";
/// Marker class Django's admin puts on time widgets.
pub const TIME_FIELD_CLASS_SELECTOR: &str = ".vTimeField";
/// Formset fields such as `result_set-0-time`.
pub const NAME_SUFFIX_SELECTOR: &str = "[name$='-time']";
pub const DEFAULT_SEPARATOR: char = ':';
/// Value lengths at which a separator is appended: after `HH` and `HH:MM`.
pub const DEFAULT_INSERT_LENGTHS: [usize; 2] = [2, 5];
/// Backspace and Tab.
pub const DEFAULT_PASSTHROUGH_KEY_CODES: [u32; 2] = [8, 9];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColonizerConfig {
    base_selector: String,
    field_selectors: Vec<String>,
    separator: char,
    insert_lengths: Vec<usize>,
    passthrough_key_codes: Vec<u32>,
}

impl Default for ColonizerConfig {
    fn default() -> Self {
        Self {
            base_selector: BASE_SELECTOR.to_string(),
            field_selectors: vec![
                TIME_FIELD_CLASS_SELECTOR.to_string(),
                NAME_SUFFIX_SELECTOR.to_string(),
            ],
            separator: DEFAULT_SEPARATOR,
            insert_lengths: DEFAULT_INSERT_LENGTHS.to_vec(),
            passthrough_key_codes: DEFAULT_PASSTHROUGH_KEY_CODES.to_vec(),
        }
    }
}

impl ColonizerConfig {
    pub fn with_base_selector(mut self, selector: impl Into<String>) -> Self {
        self.base_selector = selector.into();
        self
    }

    pub fn with_field_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// The base selector suffixed with each field selector, in order.
    pub fn combined_selectors(&self) -> Vec<String> {
        self.field_selectors
            .iter()
            .map(|suffix| format!("{}{}", self.base_selector, suffix))
            .collect()
    }
}

/// Inserts a separator while the user types a time, so `1230` reads `12:30`.
///
/// The handler runs on key-down, before the pressed character reaches the
/// value: at length 2 or 5 it appends the separator the next digit should
/// follow. Every key then collapses separator runs, which repairs values
/// left with `::` by paste, autofill, or a user typing the colon themselves.
#[derive(Debug, Clone)]
pub struct TimeFieldAutoColonizer {
    config: ColonizerConfig,
    separator_run: Regex,
    separator: String,
}

impl TimeFieldAutoColonizer {
    pub fn new(config: ColonizerConfig) -> Result<Self> {
        let separator_run = Regex::separator_run(config.separator)?;
        let separator = config.separator.to_string();
        Ok(Self {
            config,
            separator_run,
            separator,
        })
    }

    pub fn config(&self) -> &ColonizerConfig {
        &self.config
    }

    /// Subscribes [`initialize`](Self::initialize) to the page's ready event.
    pub fn install(self: Rc<Self>, page: &mut Page) -> Result<()> {
        page.on_ready(move |page| self.initialize(page).map(|_| ()))
    }

    /// Attaches the key-down handler to every field each combined selector
    /// matches right now. A field matched by several selectors gets one
    /// handler per selector, and they run back to back on each key. Returns
    /// the number of distinct managed fields; zero matches is not an error.
    pub fn initialize<H>(self: &Rc<Self>, host: &mut H) -> Result<usize>
    where
        H: FieldHost + ?Sized,
    {
        let mut managed = HashSet::new();
        for selector in self.config.combined_selectors() {
            for node in host.query_selector_all(&selector)? {
                let listener: Rc<dyn KeyDownListener> = self.clone();
                host.add_key_down_listener(node, listener)?;
                managed.insert(node);
            }
        }
        Ok(managed.len())
    }

    /// Key-down transform; `value` is the field before the browser inserts
    /// the pressed character.
    pub fn on_key_down(&self, value: &mut String, event: &KeyboardEvent) {
        if !self.config.passthrough_key_codes.contains(&event.key_code) {
            let len = value.chars().count();
            if self.config.insert_lengths.contains(&len) {
                value.push(self.config.separator);
            }
        }

        let collapsed = self.collapse_separators(value);
        if collapsed != *value {
            *value = collapsed;
        }
    }

    /// Reduces every run of consecutive separators to one. A regex engine
    /// failure leaves the text as it was.
    pub fn collapse_separators(&self, value: &str) -> String {
        match self.separator_run.replace_all(value, &self.separator) {
            Ok(collapsed) => collapsed.into_owned(),
            Err(_) => value.to_string(),
        }
    }
}

impl KeyDownListener for TimeFieldAutoColonizer {
    fn handle_key_down(&self, value: &mut String, event: &KeyboardEvent) {
        self.on_key_down(value, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colonizer() -> Result<TimeFieldAutoColonizer> {
        TimeFieldAutoColonizer::new(ColonizerConfig::default())
    }

    fn key_down(colonizer: &TimeFieldAutoColonizer, value: &str, key: Key) -> String {
        let mut value = value.to_string();
        colonizer.on_key_down(&mut value, &KeyboardEvent::new(key));
        value
    }

    #[test]
    fn default_config_combines_selectors() {
        assert_eq!(
            ColonizerConfig::default().combined_selectors(),
            vec![
                "input[type='text'].vTimeField".to_string(),
                "input[type='text'][name$='-time']".to_string(),
            ]
        );
    }

    #[test]
    fn separator_is_appended_at_two_and_five() -> Result<()> {
        let colonizer = colonizer()?;
        assert_eq!(key_down(&colonizer, "12", Key::Character('3')), "12:");
        assert_eq!(key_down(&colonizer, "12:30", Key::Character('0')), "12:30:");
        assert_eq!(key_down(&colonizer, "1", Key::Character('2')), "1");
        assert_eq!(key_down(&colonizer, "12:3", Key::Character('0')), "12:3");
        assert_eq!(key_down(&colonizer, "12:30:0", Key::Character('0')), "12:30:0");
        Ok(())
    }

    #[test]
    fn backspace_and_tab_skip_insertion() -> Result<()> {
        let colonizer = colonizer()?;
        for key in [Key::Backspace, Key::Tab] {
            assert_eq!(key_down(&colonizer, "12", key), "12");
            assert_eq!(key_down(&colonizer, "12:30", key), "12:30");
        }
        assert_eq!(key_down(&colonizer, "", Key::Backspace), "");
        Ok(())
    }

    #[test]
    fn passthrough_keys_still_collapse() -> Result<()> {
        let colonizer = colonizer()?;
        assert_eq!(key_down(&colonizer, "12::30", Key::Backspace), "12:30");
        assert_eq!(key_down(&colonizer, "1:::", Key::Tab), "1:");
        Ok(())
    }

    #[test]
    fn non_character_keys_insert_at_threshold() -> Result<()> {
        let colonizer = colonizer()?;
        // Only Backspace and Tab are exempt; arrows behave like any key.
        assert_eq!(key_down(&colonizer, "12", Key::ArrowLeft), "12:");
        assert_eq!(key_down(&colonizer, "ab", Key::Enter), "ab:");
        Ok(())
    }

    #[test]
    fn typed_colon_does_not_double() -> Result<()> {
        let colonizer = colonizer()?;
        assert_eq!(key_down(&colonizer, "12", Key::Character(':')), "12:");
        assert_eq!(key_down(&colonizer, "12:", Key::Character(':')), "12:");
        Ok(())
    }

    #[test]
    fn collapse_removes_runs_and_is_idempotent() -> Result<()> {
        let colonizer = colonizer()?;
        let once = colonizer.collapse_separators("::12:::30::::00:");
        assert_eq!(once, ":12:30:00:");
        assert_eq!(colonizer.collapse_separators(&once), once);
        assert_eq!(colonizer.collapse_separators("12::30"), "12:30");
        Ok(())
    }

    #[test]
    fn length_counts_characters_not_bytes() -> Result<()> {
        let colonizer = colonizer()?;
        assert_eq!(key_down(&colonizer, "čč", Key::Character('1')), "čč:");
        Ok(())
    }

    #[test]
    fn default_config_uses_colon() -> Result<()> {
        assert_eq!(colonizer()?.config().separator(), ':');
        Ok(())
    }

    #[test]
    fn initialize_registers_once_per_matching_selector() -> Result<()> {
        let mut page = Page::from_html(
            r#"
            <input id='both' type='text' class='vTimeField' name='start-time'>
            <input id='class' type='text' class='vTimeField'>
            <input id='name' type='text' name='form-0-time'>
            <input id='plain' type='text' name='note'>
            "#,
        )?;
        let colonizer = Rc::new(colonizer()?);
        assert_eq!(colonizer.initialize(&mut page)?, 3);
        assert_eq!(page.listener_count("#both")?, 2);
        assert_eq!(page.listener_count("#class")?, 1);
        assert_eq!(page.listener_count("#name")?, 1);
        assert_eq!(page.listener_count("#plain")?, 0);
        Ok(())
    }

    #[test]
    fn field_matching_both_selectors_runs_handler_twice() -> Result<()> {
        let mut page =
            Page::from_html("<input id='t' type='text' class='vTimeField' name='x-0-time'>")?;
        let colonizer = Rc::new(colonizer()?);
        colonizer.initialize(&mut page)?;

        // The first run collapses to length 5, so the second run appends.
        page.set_value("#t", "12::30")?;
        page.press_key("#t", '0')?;
        page.assert_value("#t", "12:30:0")?;

        page.set_value("#t", "::")?;
        page.press_key("#t", '1')?;
        page.assert_value("#t", ":1")?;
        Ok(())
    }

    #[test]
    fn initialize_on_empty_document_is_noop() -> Result<()> {
        let mut page = Page::new();
        let colonizer = Rc::new(colonizer()?);
        assert_eq!(colonizer.initialize(&mut page)?, 0);
        Ok(())
    }

    #[test]
    fn invalid_base_selector_surfaces_at_initialize() -> Result<()> {
        let mut page = Page::new();
        let colonizer = Rc::new(TimeFieldAutoColonizer::new(
            ColonizerConfig::default().with_base_selector("input["),
        )?);
        assert!(matches!(
            colonizer.initialize(&mut page),
            Err(Error::UnsupportedSelector(_))
        ));
        Ok(())
    }

    #[test]
    fn install_defers_until_ready() -> Result<()> {
        let mut page = Page::from_html("<input id='t' type='text' class='vTimeField'>")?;
        Rc::new(colonizer()?).install(&mut page)?;

        page.type_text("#t", "123")?;
        page.assert_value("#t", "123")?;

        page.set_value("#t", "")?;
        page.fire_ready()?;
        page.type_text("#t", "123")?;
        page.assert_value("#t", "12:3")?;
        Ok(())
    }
}
