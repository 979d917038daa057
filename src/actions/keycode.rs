//! Stable key-code table
//!
//! Recorded files name keys by the strings in this table, never by a
//! platform's native key enumeration. Event sources translate native codes
//! through [`KeyCode::from_virtual_key`] at the boundary.
//!
//! The table is append-only: existing names and virtual-key values never
//! change. Removing or renaming an entry requires bumping
//! [`KEY_TABLE_VERSION`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of the key table written alongside recorded keys
pub const KEY_TABLE_VERSION: u32 = 1;

macro_rules! key_table {
    ($($variant:ident = $vk:literal => $name:literal),+ $(,)?) => {
        /// A keyboard key, independent of any platform key enumeration
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum KeyCode {
            $($variant),+
        }

        impl KeyCode {
            /// Every key in table order
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$variant),+];

            /// Persisted name of the key
            pub fn name(self) -> &'static str {
                match self {
                    $(KeyCode::$variant => $name),+
                }
            }

            /// Windows virtual-key code of the key
            pub fn virtual_key(self) -> u16 {
                match self {
                    $(KeyCode::$variant => $vk),+
                }
            }

            /// Map a Windows virtual-key code into the table
            pub fn from_virtual_key(vk: u16) -> Option<Self> {
                match vk {
                    $($vk => Some(KeyCode::$variant),)+
                    _ => None,
                }
            }

            /// Look up a key by its persisted name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(KeyCode::$variant),)+
                    // Aliases accepted on read only
                    "Enter" => Some(KeyCode::Return),
                    "Next" => Some(KeyCode::PageDown),
                    "Prior" => Some(KeyCode::PageUp),
                    "Capital" => Some(KeyCode::CapsLock),
                    "Snapshot" => Some(KeyCode::PrintScreen),
                    "HanguelMode" => Some(KeyCode::KanaMode),
                    "HangulMode" => Some(KeyCode::KanaMode),
                    "KanjiMode" => Some(KeyCode::HanjaMode),
                    "IMEAceept" => Some(KeyCode::IMEAccept),
                    "Oem1" => Some(KeyCode::OemSemicolon),
                    "Oem2" => Some(KeyCode::OemQuestion),
                    "Oem3" => Some(KeyCode::Oemtilde),
                    "Oem4" => Some(KeyCode::OemOpenBrackets),
                    "Oem5" => Some(KeyCode::OemPipe),
                    "Oem6" => Some(KeyCode::OemCloseBrackets),
                    "Oem7" => Some(KeyCode::OemQuotes),
                    "Oem102" => Some(KeyCode::OemBackslash),
                    _ => None,
                }
            }
        }
    };
}

key_table! {
    LButton = 0x01 => "LButton",
    RButton = 0x02 => "RButton",
    Cancel = 0x03 => "Cancel",
    MButton = 0x04 => "MButton",
    XButton1 = 0x05 => "XButton1",
    XButton2 = 0x06 => "XButton2",
    Back = 0x08 => "Back",
    Tab = 0x09 => "Tab",
    LineFeed = 0x0A => "LineFeed",
    Clear = 0x0C => "Clear",
    Return = 0x0D => "Return",
    ShiftKey = 0x10 => "ShiftKey",
    ControlKey = 0x11 => "ControlKey",
    Menu = 0x12 => "Menu",
    Pause = 0x13 => "Pause",
    CapsLock = 0x14 => "CapsLock",
    KanaMode = 0x15 => "KanaMode",
    JunjaMode = 0x17 => "JunjaMode",
    FinalMode = 0x18 => "FinalMode",
    HanjaMode = 0x19 => "HanjaMode",
    Escape = 0x1B => "Escape",
    IMEConvert = 0x1C => "IMEConvert",
    IMENonconvert = 0x1D => "IMENonconvert",
    IMEAccept = 0x1E => "IMEAccept",
    IMEModeChange = 0x1F => "IMEModeChange",
    Space = 0x20 => "Space",
    PageUp = 0x21 => "PageUp",
    PageDown = 0x22 => "PageDown",
    End = 0x23 => "End",
    Home = 0x24 => "Home",
    Left = 0x25 => "Left",
    Up = 0x26 => "Up",
    Right = 0x27 => "Right",
    Down = 0x28 => "Down",
    Select = 0x29 => "Select",
    Print = 0x2A => "Print",
    Execute = 0x2B => "Execute",
    PrintScreen = 0x2C => "PrintScreen",
    Insert = 0x2D => "Insert",
    Delete = 0x2E => "Delete",
    Help = 0x2F => "Help",
    D0 = 0x30 => "D0",
    D1 = 0x31 => "D1",
    D2 = 0x32 => "D2",
    D3 = 0x33 => "D3",
    D4 = 0x34 => "D4",
    D5 = 0x35 => "D5",
    D6 = 0x36 => "D6",
    D7 = 0x37 => "D7",
    D8 = 0x38 => "D8",
    D9 = 0x39 => "D9",
    A = 0x41 => "A",
    B = 0x42 => "B",
    C = 0x43 => "C",
    D = 0x44 => "D",
    E = 0x45 => "E",
    F = 0x46 => "F",
    G = 0x47 => "G",
    H = 0x48 => "H",
    I = 0x49 => "I",
    J = 0x4A => "J",
    K = 0x4B => "K",
    L = 0x4C => "L",
    M = 0x4D => "M",
    N = 0x4E => "N",
    O = 0x4F => "O",
    P = 0x50 => "P",
    Q = 0x51 => "Q",
    R = 0x52 => "R",
    S = 0x53 => "S",
    T = 0x54 => "T",
    U = 0x55 => "U",
    V = 0x56 => "V",
    W = 0x57 => "W",
    X = 0x58 => "X",
    Y = 0x59 => "Y",
    Z = 0x5A => "Z",
    LWin = 0x5B => "LWin",
    RWin = 0x5C => "RWin",
    Apps = 0x5D => "Apps",
    Sleep = 0x5F => "Sleep",
    NumPad0 = 0x60 => "NumPad0",
    NumPad1 = 0x61 => "NumPad1",
    NumPad2 = 0x62 => "NumPad2",
    NumPad3 = 0x63 => "NumPad3",
    NumPad4 = 0x64 => "NumPad4",
    NumPad5 = 0x65 => "NumPad5",
    NumPad6 = 0x66 => "NumPad6",
    NumPad7 = 0x67 => "NumPad7",
    NumPad8 = 0x68 => "NumPad8",
    NumPad9 = 0x69 => "NumPad9",
    Multiply = 0x6A => "Multiply",
    Add = 0x6B => "Add",
    Separator = 0x6C => "Separator",
    Subtract = 0x6D => "Subtract",
    Decimal = 0x6E => "Decimal",
    Divide = 0x6F => "Divide",
    F1 = 0x70 => "F1",
    F2 = 0x71 => "F2",
    F3 = 0x72 => "F3",
    F4 = 0x73 => "F4",
    F5 = 0x74 => "F5",
    F6 = 0x75 => "F6",
    F7 = 0x76 => "F7",
    F8 = 0x77 => "F8",
    F9 = 0x78 => "F9",
    F10 = 0x79 => "F10",
    F11 = 0x7A => "F11",
    F12 = 0x7B => "F12",
    F13 = 0x7C => "F13",
    F14 = 0x7D => "F14",
    F15 = 0x7E => "F15",
    F16 = 0x7F => "F16",
    F17 = 0x80 => "F17",
    F18 = 0x81 => "F18",
    F19 = 0x82 => "F19",
    F20 = 0x83 => "F20",
    F21 = 0x84 => "F21",
    F22 = 0x85 => "F22",
    F23 = 0x86 => "F23",
    F24 = 0x87 => "F24",
    NumLock = 0x90 => "NumLock",
    Scroll = 0x91 => "Scroll",
    LShiftKey = 0xA0 => "LShiftKey",
    RShiftKey = 0xA1 => "RShiftKey",
    LControlKey = 0xA2 => "LControlKey",
    RControlKey = 0xA3 => "RControlKey",
    LMenu = 0xA4 => "LMenu",
    RMenu = 0xA5 => "RMenu",
    BrowserBack = 0xA6 => "BrowserBack",
    BrowserForward = 0xA7 => "BrowserForward",
    BrowserRefresh = 0xA8 => "BrowserRefresh",
    BrowserStop = 0xA9 => "BrowserStop",
    BrowserSearch = 0xAA => "BrowserSearch",
    BrowserFavorites = 0xAB => "BrowserFavorites",
    BrowserHome = 0xAC => "BrowserHome",
    VolumeMute = 0xAD => "VolumeMute",
    VolumeDown = 0xAE => "VolumeDown",
    VolumeUp = 0xAF => "VolumeUp",
    MediaNextTrack = 0xB0 => "MediaNextTrack",
    MediaPreviousTrack = 0xB1 => "MediaPreviousTrack",
    MediaStop = 0xB2 => "MediaStop",
    MediaPlayPause = 0xB3 => "MediaPlayPause",
    LaunchMail = 0xB4 => "LaunchMail",
    SelectMedia = 0xB5 => "SelectMedia",
    LaunchApplication1 = 0xB6 => "LaunchApplication1",
    LaunchApplication2 = 0xB7 => "LaunchApplication2",
    OemSemicolon = 0xBA => "OemSemicolon",
    Oemplus = 0xBB => "Oemplus",
    Oemcomma = 0xBC => "Oemcomma",
    OemMinus = 0xBD => "OemMinus",
    OemPeriod = 0xBE => "OemPeriod",
    OemQuestion = 0xBF => "OemQuestion",
    Oemtilde = 0xC0 => "Oemtilde",
    OemOpenBrackets = 0xDB => "OemOpenBrackets",
    OemPipe = 0xDC => "OemPipe",
    OemCloseBrackets = 0xDD => "OemCloseBrackets",
    OemQuotes = 0xDE => "OemQuotes",
    Oem8 = 0xDF => "Oem8",
    OemBackslash = 0xE2 => "OemBackslash",
    ProcessKey = 0xE5 => "ProcessKey",
    Packet = 0xE7 => "Packet",
    Attn = 0xF6 => "Attn",
    Crsel = 0xF7 => "Crsel",
    Exsel = 0xF8 => "Exsel",
    EraseEof = 0xF9 => "EraseEof",
    Play = 0xFA => "Play",
    Zoom = 0xFB => "Zoom",
    NoName = 0xFC => "NoName",
    Pa1 = 0xFD => "Pa1",
    OemClear = 0xFE => "OemClear",
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a key name missing from the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key name '{}'", self.0)
    }
}

impl std::error::Error for UnknownKey {}

impl FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyCode::from_name(s).ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl TryFrom<String> for KeyCode {
    type Error = UnknownKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for &'static str {
    fn from(key: KeyCode) -> Self {
        key.name()
    }
}
