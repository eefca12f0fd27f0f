//! Static controller tables
//!
//! Button indices follow the standard gamepad mapping where the hardware
//! allows it; the names are what the controller prints on its face.

use super::{stick_pairs, DeviceModel, DpadButtons, RawDeviceId, Signature, StickPair};
use once_cell::sync::Lazy;
use std::sync::Arc;

const SONY: u16 = 0x054c;
const MICROSOFT: u16 = 0x045e;
const NINTENDO: u16 = 0x057e;
const VALVE: u16 = 0x28de;
const EIGHT_BIT_DO: u16 = 0x2dc8;

const STANDARD_DPAD: DpadButtons = DpadButtons {
    up: 12,
    down: 13,
    left: 14,
    right: 15,
};

struct ModelSpec {
    name: &'static str,
    signatures: &'static [(u16, u16)],
    patterns: &'static [&'static str],
    buttons: &'static [&'static str],
    axes: usize,
    hats: usize,
    dpad: Option<DpadButtons>,
    stick_button: Option<u8>,
}

const PLAYSTATION_TAIL: [&str; 8] = [
    "Left Stick",
    "Right Stick",
    "D-Pad Up",
    "D-Pad Down",
    "D-Pad Left",
    "D-Pad Right",
    "PS",
    "Pad",
];

static SPECS: &[ModelSpec] = &[
    ModelSpec {
        name: "DualShock 3",
        signatures: &[(SONY, 0x0268)],
        patterns: &["dualshock 3", "playstation(r)3", "ps3 controller"],
        buttons: &[
            "Cross", "Circle", "Square", "Triangle", "Left Shoulder", "Right Shoulder",
            "Left Trigger", "Right Trigger", "Select", "Start", "Left Stick", "Right Stick",
            "D-Pad Up", "D-Pad Down", "D-Pad Left", "D-Pad Right",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "DualShock 4",
        signatures: &[(SONY, 0x05c4), (SONY, 0x09cc), (SONY, 0x0ba0)],
        patterns: &["dualshock 4", "ps4 controller"],
        buttons: &[
            "Cross", "Circle", "Square", "Triangle", "Left Shoulder", "Right Shoulder",
            "Left Trigger", "Right Trigger", "Share", "Options", PLAYSTATION_TAIL[0],
            PLAYSTATION_TAIL[1], PLAYSTATION_TAIL[2], PLAYSTATION_TAIL[3], PLAYSTATION_TAIL[4],
            PLAYSTATION_TAIL[5], PLAYSTATION_TAIL[6], PLAYSTATION_TAIL[7],
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "DualSense",
        signatures: &[(SONY, 0x0ce6), (SONY, 0x0df2)],
        patterns: &["dualsense", "ps5 controller"],
        buttons: &[
            "Cross", "Circle", "Square", "Triangle", "Left Shoulder", "Right Shoulder",
            "Left Trigger", "Right Trigger", "Create", "Options", PLAYSTATION_TAIL[0],
            PLAYSTATION_TAIL[1], PLAYSTATION_TAIL[2], PLAYSTATION_TAIL[3], PLAYSTATION_TAIL[4],
            PLAYSTATION_TAIL[5], PLAYSTATION_TAIL[6], PLAYSTATION_TAIL[7],
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Xbox Series",
        signatures: &[(MICROSOFT, 0x0b12), (MICROSOFT, 0x0b13)],
        patterns: &["xbox series"],
        buttons: &[
            "A", "B", "X", "Y", "Left Shoulder", "Right Shoulder", "Left Trigger",
            "Right Trigger", "View", "Menu", "Left Stick", "Right Stick", "D-Pad Up",
            "D-Pad Down", "D-Pad Left", "D-Pad Right", "Xbox", "Share",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Xbox One",
        signatures: &[
            (MICROSOFT, 0x02d1),
            (MICROSOFT, 0x02dd),
            (MICROSOFT, 0x02e3),
            (MICROSOFT, 0x02ea),
            (MICROSOFT, 0x02fd),
            (MICROSOFT, 0x0b00),
        ],
        patterns: &["xbox one", "xbox wireless controller"],
        buttons: &[
            "A", "B", "X", "Y", "Left Shoulder", "Right Shoulder", "Left Trigger",
            "Right Trigger", "View", "Menu", "Left Stick", "Right Stick", "D-Pad Up",
            "D-Pad Down", "D-Pad Left", "D-Pad Right", "Xbox",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Xbox 360",
        signatures: &[(MICROSOFT, 0x028e), (MICROSOFT, 0x028f), (MICROSOFT, 0x0719)],
        patterns: &["xbox 360", "x360", "xinput"],
        buttons: &[
            "A", "B", "X", "Y", "Left Shoulder", "Right Shoulder", "Left Trigger",
            "Right Trigger", "Back", "Start", "Left Stick", "Right Stick", "D-Pad Up",
            "D-Pad Down", "D-Pad Left", "D-Pad Right", "Xbox",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Switch Pro",
        signatures: &[(NINTENDO, 0x2009)],
        patterns: &["pro controller"],
        buttons: &[
            "A", "B", "X", "Y", "Left Shoulder", "Right Shoulder", "Left Trigger",
            "Right Trigger", "Minus", "Plus", "Left Stick", "Right Stick", "D-Pad Up",
            "D-Pad Down", "D-Pad Left", "D-Pad Right", "Home", "Capture",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Steam Controller",
        signatures: &[(VALVE, 0x1102), (VALVE, 0x1142)],
        patterns: &["steam controller"],
        buttons: &[
            "A", "B", "X", "Y", "Left Shoulder", "Right Shoulder", "Left Trigger",
            "Right Trigger", "Back", "Start", "Stick", "Right Track", "Left Track Up",
            "Left Track Down", "Left Track Left", "Left Track Right", "Left Grip",
            "Right Grip", "Right Track Up", "Right Track Down", "Right Track Left",
            "Right Track Right", "Steam",
        ],
        axes: 4,
        hats: 0,
        dpad: Some(STANDARD_DPAD),
        stick_button: Some(10),
    },
    ModelSpec {
        name: "Wii Remote",
        signatures: &[(NINTENDO, 0x0306), (NINTENDO, 0x0330)],
        patterns: &["wii remote", "nintendo rvl"],
        buttons: &["1", "2", "A", "B", "Plus", "Minus", "Home", "Z"],
        axes: 0,
        hats: 1,
        dpad: None,
        stick_button: None,
    },
    ModelSpec {
        name: "Joy-Con Right",
        signatures: &[(NINTENDO, 0x2007)],
        patterns: &["joy-con (r)", "joycon (r)", "joy-con right"],
        buttons: &[
            "A", "X", "B", "Y", "Left Shoulder", "Right Shoulder", "Plus", "Right Stick",
            "Home", "D-Pad Up", "D-Pad Down", "D-Pad Left", "D-Pad Right",
        ],
        axes: 2,
        hats: 0,
        dpad: Some(DpadButtons {
            up: 9,
            down: 10,
            left: 11,
            right: 12,
        }),
        stick_button: Some(7),
    },
    ModelSpec {
        name: "Joy-Con Left",
        signatures: &[(NINTENDO, 0x2006)],
        patterns: &["joy-con (l)", "joycon (l)", "joy-con left"],
        buttons: &[
            "Left", "Down", "Up", "Right", "Left Shoulder", "Right Shoulder", "Minus",
            "Left Stick", "Capture", "D-Pad Up", "D-Pad Down", "D-Pad Left", "D-Pad Right",
        ],
        axes: 2,
        hats: 0,
        dpad: Some(DpadButtons {
            up: 9,
            down: 10,
            left: 11,
            right: 12,
        }),
        stick_button: Some(7),
    },
    ModelSpec {
        name: "Super Nintendo",
        signatures: &[(NINTENDO, 0x2017)],
        patterns: &["snes controller", "super nintendo"],
        buttons: &[
            "B", "X", "A", "Y", "Left Shoulder", "Right Shoulder", "Start", "Select",
            "D-Pad Up", "D-Pad Down", "D-Pad Left", "D-Pad Right",
        ],
        axes: 0,
        hats: 0,
        dpad: Some(DpadButtons {
            up: 8,
            down: 9,
            left: 10,
            right: 11,
        }),
        stick_button: None,
    },
];

static MODELS: Lazy<Vec<Arc<DeviceModel>>> =
    Lazy::new(|| SPECS.iter().map(|spec| Arc::new(build(spec))).collect());

fn build(spec: &ModelSpec) -> DeviceModel {
    let sticks: Vec<StickPair> = if spec.name.starts_with("Joy-Con") {
        vec![StickPair {
            name: "Stick".to_string(),
            x_axis: 0,
            y_axis: Some(1),
        }]
    } else {
        stick_pairs(spec.axes)
    };

    DeviceModel {
        name: spec.name.to_string(),
        signatures: spec
            .signatures
            .iter()
            .map(|&(v, p)| Signature::new(v, p))
            .collect(),
        name_patterns: spec.patterns.iter().map(|p| p.to_string()).collect(),
        buttons: spec.buttons.iter().map(|b| b.to_string()).collect(),
        axes: spec.axes,
        hats: spec.hats,
        sticks,
        dpad: spec.dpad,
        stick_button: spec.stick_button,
        generic: false,
    }
}

/// All known controller models, in lookup priority order
pub fn builtin_models() -> &'static [Arc<DeviceModel>] {
    &MODELS
}

/// Find a known model by its display name (case-insensitive)
pub fn find_model(name: &str) -> Option<Arc<DeviceModel>> {
    MODELS
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .cloned()
}

/// Match a raw identifier against the tables
///
/// Signatures are checked before name patterns so a renamed Bluetooth
/// device still resolves by its IDs. 8BitDo pads report a Switch Pro layout
/// and are only recognized when `detect_8bitdo` is enabled.
pub(crate) fn lookup(raw: &RawDeviceId, detect_8bitdo: bool) -> Option<Arc<DeviceModel>> {
    if let Some(signature) = raw.signature() {
        if let Some(model) = MODELS.iter().find(|m| m.matches_signature(signature)) {
            return Some(model.clone());
        }
    }

    if let Some(model) = MODELS.iter().find(|m| m.matches_name(&raw.name)) {
        return Some(model.clone());
    }

    let is_8bitdo =
        raw.vendor_id == Some(EIGHT_BIT_DO) || raw.name.to_lowercase().contains("8bitdo");
    if detect_8bitdo && is_8bitdo {
        return find_model("Switch Pro");
    }

    None
}
