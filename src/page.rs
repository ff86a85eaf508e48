use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Complete,
}

type ReadyCallback = Box<dyn FnOnce(&mut Page) -> Result<()>>;

#[derive(Default)]
struct KeyDownListenerStore {
    map: HashMap<NodeId, Vec<Rc<dyn KeyDownListener>>>,
}

impl KeyDownListenerStore {
    fn add(&mut self, node_id: NodeId, listener: Rc<dyn KeyDownListener>) {
        self.map.entry(node_id).or_default().push(listener);
    }

    fn get(&self, node_id: NodeId) -> Vec<Rc<dyn KeyDownListener>> {
        self.map.get(&node_id).cloned().unwrap_or_default()
    }

    fn count(&self, node_id: NodeId) -> usize {
        self.map.get(&node_id).map(Vec::len).unwrap_or(0)
    }
}

/// In-memory document that plays the browser's part for field behaviors:
/// element lookup, the one-shot ready event, key dispatch with default
/// actions, and an opt-in trace log.
pub struct Page {
    dom: Dom,
    listeners: KeyDownListenerStore,
    ready_state: ReadyState,
    ready_callbacks: Vec<ReadyCallback>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self::with_dom(Dom::new())
    }
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_html(html: &str) -> Result<Self> {
        let dom = html::parse_html(html)?;
        Ok(Self::with_dom(dom))
    }

    fn with_dom(dom: Dom) -> Self {
        Self {
            dom,
            listeners: KeyDownListenerStore::default(),
            ready_state: ReadyState::Loading,
            ready_callbacks: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::TypeMismatch {
                selector: "trace_log_limit".into(),
                expected: "at least 1 entry".into(),
                actual: "0".into(),
            });
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Queues `callback` for the ready event. Once the page is ready,
    /// callbacks run immediately instead.
    pub fn on_ready<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnOnce(&mut Page) -> Result<()> + 'static,
    {
        if self.ready_state == ReadyState::Complete {
            self.trace_line("[ready] late subscriber runs immediately".into());
            return callback(self);
        }
        self.ready_callbacks.push(Box::new(callback));
        Ok(())
    }

    /// Fires the ready event. Only the first call has an effect.
    ///
    /// Every queued callback runs even if an earlier one fails; the first
    /// failure is returned.
    pub fn fire_ready(&mut self) -> Result<()> {
        if self.ready_state == ReadyState::Complete {
            self.trace_line("[ready] already fired".into());
            return Ok(());
        }
        self.ready_state = ReadyState::Complete;

        let callbacks = std::mem::take(&mut self.ready_callbacks);
        self.trace_line(format!("[ready] fired callbacks={}", callbacks.len()));

        let mut first_error = None;
        for callback in callbacks {
            if let Err(err) = callback(self) {
                self.trace_line(format!("[ready] callback failed: {err}"));
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn press_key(&mut self, selector: &str, key: impl Into<Key>) -> Result<()> {
        self.press_key_event(selector, KeyboardEvent::new(key.into()))
    }

    /// Dispatches key-down to the element's listeners in registration order,
    /// then applies the key's default action to the value.
    pub fn press_key_event(&mut self, selector: &str, event: KeyboardEvent) -> Result<()> {
        let target = self.select_text_control(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let value_before = self.dom.value(target).unwrap_or_default().to_string();
        let mut value = value_before.clone();
        for listener in self.listeners.get(target) {
            listener.handle_key_down(&mut value, &event);
        }
        let after_listeners = value.clone();

        if !self.dom.readonly(target) {
            apply_default_action(&mut value, event.key, self.dom.max_length(target));
        }

        if self.trace {
            let target_label = self.dom.node_label(target);
            self.trace_line(format!(
                "[key] keydown key={} code={} target={} value_before={:?} after_listeners={:?} value_after={:?}",
                event.key, event.key_code, target_label, value_before, after_listeners, value
            ));
        }

        if let Some(slot) = self.dom.value_mut(target) {
            *slot = value;
        }
        Ok(())
    }

    /// Presses one key per character of `text`, left to right.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        for ch in text.chars() {
            self.press_key(selector, Key::from(ch))?;
        }
        Ok(())
    }

    /// Replaces the value without key events, the way paste or autofill do.
    pub fn set_value(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_text_control(selector)?;
        if let Some(slot) = self.dom.value_mut(target) {
            *slot = value.to_string();
        }
        Ok(())
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom
            .value(target)
            .map(str::to_string)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "element".into(),
                actual: "non-element".into(),
            })
    }

    pub fn listener_count(&self, selector: &str) -> Result<usize> {
        let target = self.select_one(selector)?;
        Ok(self.listeners.count(target))
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target).unwrap_or_default().to_string();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn select_text_control(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        if !self.dom.is_text_control(target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: self.dom.tag_name(target).unwrap_or("non-element").to_string(),
            });
        }
        Ok(target)
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }
}

fn apply_default_action(value: &mut String, key: Key, max_length: Option<usize>) {
    match key {
        Key::Backspace => {
            value.pop();
        }
        other => {
            let Some(ch) = other.inserted_char() else {
                return;
            };
            if max_length.is_some_and(|max| value.chars().count() >= max) {
                return;
            }
            value.push(ch);
        }
    }
}

impl ElementQuery for Page {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }
}

impl KeyDownRegistry for Page {
    fn add_key_down_listener(
        &mut self,
        node: NodeId,
        listener: Rc<dyn KeyDownListener>,
    ) -> Result<()> {
        if self.dom.element(node).is_none() {
            return Err(Error::TypeMismatch {
                selector: format!("{node:?}"),
                expected: "element".into(),
                actual: "non-element".into(),
            });
        }
        self.listeners.add(node, listener);
        let label = self.dom.node_label(node);
        self.trace_line(format!(
            "[listener] keydown added target={label} total={}",
            self.listeners.count(node)
        ));
        Ok(())
    }
}
