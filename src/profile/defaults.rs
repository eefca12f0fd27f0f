//! Default profiles generated from the device tables
//!
//! Bindings use the standard layout indices and are dropped for buttons the
//! model does not have, so small controllers get a trimmed version.

use super::{AxisRole, Context, InputRef, Profile};
use crate::action::{Action, Command, QuickSelectMode};
use crate::device::DeviceModel;
use crate::input::Direction;

/// Default profile name for a model
pub fn default_profile_name(model: &DeviceModel) -> String {
    model.name.clone()
}

/// Build the default profile for a model
pub fn default_profile(model: &DeviceModel) -> Profile {
    use Command::*;

    let mut profile = Profile::new(default_profile_name(model), model);
    let buttons = model.button_count();
    let has = |b: u8| (b as usize) < buttons;

    let bind = |profile: &mut Profile, context: Context, input: InputRef, action: Action| {
        if input.buttons().iter().all(|b| has(*b)) {
            profile.update_binding(context, input, Some(action));
        }
    };

    let global = [
        (0, Enter),
        (1, Back),
        (2, Undo),
        (5, SelectNext),
        (8, MainScreen),
        (9, Sync),
        (10, Click),
        (11, HideCursor),
        (12, Up),
        (13, Down),
        (14, SelectPrevious),
        (15, SelectNext),
    ];
    for (button, command) in global {
        bind(&mut profile, Context::Global, InputRef::Button(button), Action::command(command));
    }
    bind(&mut profile, Context::Global, InputRef::Button(3), Action::QuickSelect(QuickSelectMode::Toggle));
    bind(&mut profile, Context::Global, InputRef::Button(4), Action::Modifier);
    bind(&mut profile, Context::Global, InputRef::Button(6), Action::command(ScrollUp));
    bind(&mut profile, Context::Global, InputRef::Button(7), Action::command(ScrollDown));
    if let Some(chord) = InputRef::chord([4, 2]) {
        bind(&mut profile, Context::Global, chord, Action::command(Redo));
    }
    if let Some(chord) = InputRef::chord([4, 9]) {
        bind(&mut profile, Context::Global, chord, Action::command(Preferences));
    }
    bind(&mut profile, Context::Global, InputRef::LongPress(8), Action::command(Statistics));

    bind(&mut profile, Context::DeckBrowser, InputRef::Button(0), Action::command(Select));
    bind(&mut profile, Context::DeckBrowser, InputRef::Button(12), Action::command(PreviousDeck));
    bind(&mut profile, Context::DeckBrowser, InputRef::Button(13), Action::command(NextDeck));
    bind(&mut profile, Context::DeckBrowser, InputRef::Button(14), Action::command(CollapseExpand));
    bind(&mut profile, Context::DeckBrowser, InputRef::Button(15), Action::command(CollapseExpand));

    bind(&mut profile, Context::Overview, InputRef::Button(0), Action::command(Review));
    bind(&mut profile, Context::Overview, InputRef::Button(2), Action::command(CustomStudy));
    bind(&mut profile, Context::Overview, InputRef::Button(12), Action::command(PreviousDeck));
    bind(&mut profile, Context::Overview, InputRef::Button(13), Action::command(NextDeck));

    for context in [Context::Review, Context::Question] {
        bind(&mut profile, context, InputRef::Button(0), Action::command(FlipCard));
        bind(&mut profile, context, InputRef::Button(5), Action::command(CardInfo));
        bind(&mut profile, context, InputRef::LongPress(5), Action::command(PreviousCardInfo));
        if let Some(chord) = InputRef::chord([4, 1]) {
            bind(&mut profile, context, chord, Action::command(BuryCard));
        }
        if let Some(chord) = InputRef::chord([4, 3]) {
            bind(&mut profile, context, chord, Action::command(SuspendCard));
        }
    }

    for (button, command) in [(0, Good), (1, Again), (2, Hard), (3, Easy)] {
        bind(&mut profile, Context::Answer, InputRef::Button(button), Action::command(command));
    }
    bind(&mut profile, Context::Answer, InputRef::Button(12), Action::command(FlipCard));

    bind(&mut profile, Context::Dialog, InputRef::Button(0), Action::command(Select));
    bind(&mut profile, Context::Dialog, InputRef::Button(1), Action::command(Escape));

    if model.hats > 0 {
        for (direction, command) in [(Direction::Up, Up), (Direction::Down, Down)] {
            bind(
                &mut profile,
                Context::Global,
                InputRef::Hat { hat: 0, direction },
                Action::command(command),
            );
        }
    }

    // Two-stick pads steer the cursor with the left stick and scroll with the
    // right; single-stick pads use their stick as a d-pad
    match model.axes {
        0 => {}
        1 | 2 | 3 => {
            profile.axes.roles.insert(0, AxisRole::Buttons);
            if model.axes > 1 {
                profile.axes.roles.insert(1, AxisRole::Buttons);
            }
            profile.axes.stick_zones = 4;
            for (direction, command) in [
                (Direction::Up, Up),
                (Direction::Down, Down),
                (Direction::Left, SelectPrevious),
                (Direction::Right, SelectNext),
            ] {
                bind(&mut profile, Context::Global, InputRef::Stick { stick: 0, direction }, Action::command(command));
            }
        }
        _ => {
            profile.axes.roles.insert(0, AxisRole::CursorHorizontal);
            profile.axes.roles.insert(1, AxisRole::CursorVertical);
            profile.axes.roles.insert(2, AxisRole::ScrollHorizontal);
            profile.axes.roles.insert(3, AxisRole::ScrollVertical);
        }
    }

    profile.quick_select.stick = if model.axes >= 4 { 1 } else { 0 };
    profile.quick_select.select_with_stick = model.axes > 0;
    profile.quick_select.confirm_button = 0;
    profile.quick_select.entries.insert(
        Context::Review,
        vec![
            Action::command(SuspendCard),
            Action::command(SuspendNote),
            Action::command(BuryCard),
            Action::command(BuryNote),
            Action::command(CardInfo),
        ],
    );
    profile.quick_select.entries.insert(
        Context::DeckBrowser,
        vec![
            Action::command(Sync),
            Action::command(Browser),
            Action::command(Statistics),
            Action::command(CheckDatabase),
            Action::command(StudyDeck),
        ],
    );
    profile.quick_select.entries.insert(
        Context::Global,
        vec![
            Action::command(Undo),
            Action::command(Redo),
            Action::command(Fullscreen),
            Action::command(Preferences),
        ],
    );

    profile
}
