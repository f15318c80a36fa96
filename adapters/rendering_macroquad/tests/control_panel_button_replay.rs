use convoy_rendering_macroquad::ControlPanelInputState;

fn run_pause_sequence(sequence: &[bool]) -> Vec<bool> {
    let mut state = ControlPanelInputState::default();
    let mut toggles = Vec::new();
    for &pressed in sequence {
        toggles.push(state.take_pause());
        if pressed {
            state.register_pause();
        }
    }

    // Flush any trailing latched press so the harness observes the final toggle.
    toggles.push(state.take_pause());
    toggles
}

fn run_reset_sequence(sequence: &[bool]) -> Vec<bool> {
    let mut state = ControlPanelInputState::default();
    let mut presses = Vec::new();
    for &pressed in sequence {
        presses.push(state.take_reset());
        if pressed {
            state.register_reset();
        }
    }
    presses.push(state.take_reset());
    presses
}

#[test]
fn pause_button_sequence_is_deterministic() {
    let button_sequence = [false, true, false, true, true, false];
    let expected = vec![false, false, true, false, true, true, false];

    let first_run = run_pause_sequence(&button_sequence);
    let second_run = run_pause_sequence(&button_sequence);

    assert_eq!(first_run, expected);
    assert_eq!(first_run, second_run);
}

#[test]
fn reset_button_sequence_is_deterministic() {
    let button_sequence = [true, false, true, false, false, true];
    let expected = vec![false, true, false, true, false, false, true];

    let first_run = run_reset_sequence(&button_sequence);
    let second_run = run_reset_sequence(&button_sequence);

    assert_eq!(first_run, expected);
    assert_eq!(first_run, second_run);
}

#[test]
fn latches_are_independent() {
    let mut state = ControlPanelInputState::default();
    state.register_mute();
    state.register_voice();

    assert!(!state.take_pause());
    assert!(!state.take_reset());
    assert!(state.take_mute());
    assert!(state.take_voice());
    assert!(!state.take_mute());
    assert!(!state.take_voice());
}
