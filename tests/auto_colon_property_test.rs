use std::rc::Rc;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};
use time_field_colon::{ColonizerConfig, Key, KeyboardEvent, Page, TimeFieldAutoColonizer};

const AUTO_COLON_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/auto_colon_property_test.txt";
const DEFAULT_AUTO_COLON_PROPTEST_CASES: u32 = 256;

const TIME_FORM_HTML: &str = r#"
<form id="result_form">
  <input type="text" id="time" name="result_set-0-time">
  <input type="text" id="note" name="note">
</form>
"#;

fn auto_colon_proptest_cases() -> u32 {
    std::env::var("TIME_FIELD_COLON_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_AUTO_COLON_PROPTEST_CASES)
}

fn ready_page() -> Result<Page, TestCaseError> {
    let mut page =
        Page::from_html(TIME_FORM_HTML).map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    let colonizer = TimeFieldAutoColonizer::new(ColonizerConfig::default())
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    Rc::new(colonizer)
        .install(&mut page)
        .and_then(|_| page.fire_ready())
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    Ok(page)
}

fn colonizer() -> Result<TimeFieldAutoColonizer, TestCaseError> {
    TimeFieldAutoColonizer::new(ColonizerConfig::default())
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))
}

fn digit_strategy() -> BoxedStrategy<char> {
    (0u32..10)
        .prop_map(|digit| char::from_digit(digit, 10).unwrap_or('0'))
        .boxed()
}

fn colon_heavy_text_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            4 => Just(':'),
            2 => digit_strategy(),
            1 => Just(' '),
            1 => Just('h'),
        ],
        0..=24,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn key_strategy() -> BoxedStrategy<Key> {
    prop_oneof![
        6 => digit_strategy().prop_map(Key::Character),
        2 => Just(Key::Character(':')),
        2 => Just(Key::Backspace),
        1 => Just(Key::Tab),
        1 => Just(Key::ArrowLeft),
        1 => Just(Key::ArrowRight),
        1 => Just(Key::Delete),
        1 => Just(Key::Enter),
    ]
    .boxed()
}

fn assert_digits_form_time(digits: &[char]) -> TestCaseResult {
    let mut page = ready_page()?;
    for (step, digit) in digits.iter().enumerate() {
        page.press_key("#time", *digit)
            .map_err(|err| TestCaseError::fail(format!("step {step}: {err:?}")))?;
    }

    let actual = page
        .value("#time")
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    let expected = format!(
        "{}{}:{}{}:{}{}",
        digits[0], digits[1], digits[2], digits[3], digits[4], digits[5]
    );
    prop_assert_eq!(actual, expected);
    Ok(())
}

fn assert_key_sequence_keeps_single_colons(keys: &[Key]) -> TestCaseResult {
    let mut page = ready_page()?;
    let colonizer = colonizer()?;

    for (step, key) in keys.iter().enumerate() {
        let before = page
            .value("#time")
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;

        let mut expected_in_handler = before.clone();
        colonizer.on_key_down(&mut expected_in_handler, &KeyboardEvent::new(*key));
        prop_assert!(
            !expected_in_handler.contains("::"),
            "handler left adjacent colons at step {step}: {expected_in_handler:?}"
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            page.press_key("#time", *key)
        }));
        match outcome {
            Err(_) => prop_assert!(false, "key panicked at step {step}: {key:?}, keys={keys:?}"),
            Ok(Err(error)) => prop_assert!(
                false,
                "key returned error at step {step}: {key:?}, error={error:?}, keys={keys:?}"
            ),
            Ok(Ok(())) => {}
        }

        let after = page
            .value("#time")
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
        let mut expected_after = expected_in_handler;
        match key {
            Key::Backspace => {
                expected_after.pop();
            }
            other => {
                if let Some(ch) = other.inserted_char() {
                    expected_after.push(ch);
                }
            }
        }
        prop_assert_eq!(after, expected_after, "step {} key {:?}", step, key);
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: auto_colon_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(AUTO_COLON_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn six_digits_typed_left_to_right_form_hh_mm_ss(digits in vec(digit_strategy(), 6)) {
        assert_digits_form_time(&digits)?;
    }

    #[test]
    fn collapse_leaves_no_adjacent_colons_and_is_idempotent(text in colon_heavy_text_strategy()) {
        let colonizer = colonizer()?;
        let once = colonizer.collapse_separators(&text);
        prop_assert!(!once.contains("::"), "adjacent colons remain in {:?}", once);
        prop_assert_eq!(colonizer.collapse_separators(&once), once.clone());
        prop_assert_eq!(once.replace(':', ""), text.replace(':', ""));
    }

    #[test]
    fn backspace_and_tab_never_insert(
        prefix in vec(digit_strategy(), 0..=7),
        tab in any::<bool>(),
    ) {
        let colonizer = colonizer()?;
        let key = if tab { Key::Tab } else { Key::Backspace };
        let original: String = prefix.into_iter().collect();
        let mut value = original.clone();
        colonizer.on_key_down(&mut value, &KeyboardEvent::new(key));
        prop_assert_eq!(value, original);
    }

    #[test]
    fn random_key_sequences_keep_single_colons(keys in vec(key_strategy(), 1..=32)) {
        assert_key_sequence_keeps_single_colons(&keys)?;
    }

    #[test]
    fn unmanaged_fields_are_never_rewritten(text in colon_heavy_text_strategy()) {
        let mut page = ready_page()?;
        page.set_value("#note", &text)
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
        page.press_key("#note", Key::Tab)
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
        let actual = page
            .value("#note")
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
        prop_assert_eq!(actual, text);
    }
}
