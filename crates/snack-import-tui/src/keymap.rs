use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_next_field(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Tab | KeyCode::Down)
}

pub(crate) fn is_previous_field(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::BackTab | KeyCode::Up)
}

pub(crate) fn is_toggle_advanced(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('a')
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::{is_back, is_confirm, is_next_field, is_previous_field, is_toggle_advanced};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn field_navigation_matches_tab_and_arrows() {
        assert!(is_next_field(key(KeyCode::Tab)));
        assert!(is_next_field(key(KeyCode::Down)));
        assert!(is_previous_field(key(KeyCode::BackTab)));
        assert!(is_previous_field(key(KeyCode::Up)));
        assert!(!is_next_field(key(KeyCode::Char('j'))));
    }

    #[test]
    fn toggle_advanced_requires_control() {
        assert!(is_toggle_advanced(KeyEvent::new(
            KeyCode::Char('a'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_toggle_advanced(key(KeyCode::Char('a'))));
    }

    #[test]
    fn confirm_and_back_match_contract() {
        assert!(is_confirm(key(KeyCode::Enter)));
        assert!(is_back(key(KeyCode::Esc)));
        assert!(!is_back(key(KeyCode::Enter)));
    }
}
