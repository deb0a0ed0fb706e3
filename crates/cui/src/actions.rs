use crate::app::App;
use crate::input::InputAction;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::Lottery(key) => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.press(key);
            }
        }
        InputAction::NextPrize => app.cycle_prize(true),
        InputAction::PrevPrize => app.cycle_prize(false),
        InputAction::ToggleUsed => app.toggle_current_prize(),
        InputAction::ResetWinners => app.reset_winners(),
        InputAction::ClearLog => app.event_log.clear(),
    }
}
