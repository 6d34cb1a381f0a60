//! Menu tree and callback routing.
//!
//! A chat front end shows inline-button menus; each button carries a short
//! callback string. This module owns both directions: [`Menu::buttons`]
//! lists what to show, and [`parse_callback`] turns a pressed button back
//! into either another menu or a runnable [`Request`].
//!
//! ```text
//! main ─┬─ resize  → resize_{8k,4k,1080p,720p,mobile}
//!       ├─ crop    → crop_{smart,square,portrait,landscape}
//!       ├─ remove_bg
//!       ├─ generate_bg
//!       ├─ enhance → enhance_{8k,4k,1080p,720p,original}
//!       └─ convert → convert_{jpeg,png,webp}
//! ```
//!
//! `back` (or `back_main`) returns to the main menu from anywhere.

use crate::imaging::{
    self, CropStyle, ImageBackend, ImageProcessingError, OutputFormat, OutputSettings, Resolution,
};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown callback: {0:?}")]
    UnknownCallback(String),
}

/// A keyboard the front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    Resize,
    Crop,
    Convert,
    Enhance,
}

/// One button: `(label, callback)`.
pub type Button = (&'static str, &'static str);

impl Menu {
    pub const ALL: [Menu; 5] = [
        Self::Main,
        Self::Resize,
        Self::Crop,
        Self::Convert,
        Self::Enhance,
    ];

    /// Prompt shown above the keyboard.
    pub fn title(self) -> &'static str {
        match self {
            Self::Main => "Choose what you want to do:",
            Self::Resize => "Choose resize option:",
            Self::Crop => "Choose crop option:",
            Self::Convert => "Choose format:",
            Self::Enhance => "Choose enhancement quality:",
        }
    }

    /// Keyboard rows, two buttons per row.
    pub fn buttons(self) -> Vec<Vec<Button>> {
        const BACK: Button = ("🔙 Back", "back");
        match self {
            Self::Main => vec![
                vec![("📏 Resize", "resize"), ("✂️ Crop", "crop")],
                vec![("🎭 Remove BG", "remove_bg"), ("🖼️ Generate BG", "generate_bg")],
                vec![("⬆️ Enhance Quality", "enhance"), ("🔄 Convert Format", "convert")],
            ],
            Self::Resize => vec![
                vec![("8K (7680x4320)", "resize_8k"), ("4K (3840x2160)", "resize_4k")],
                vec![
                    ("1080p (1920x1080)", "resize_1080p"),
                    ("720p (1280x720)", "resize_720p"),
                ],
                vec![("📱 Mobile (720x1280)", "resize_mobile"), BACK],
            ],
            Self::Crop => vec![
                vec![("⭐ Smart Crop", "crop_smart"), ("⬜ Square (1:1)", "crop_square")],
                vec![
                    ("📱 Portrait (9:16)", "crop_portrait"),
                    ("🖥️ Landscape (16:9)", "crop_landscape"),
                ],
                vec![BACK],
            ],
            Self::Convert => vec![
                vec![("📄 JPEG", "convert_jpeg"), ("🖼️ PNG", "convert_png")],
                vec![("🌐 WebP", "convert_webp"), BACK],
            ],
            Self::Enhance => vec![
                vec![("8K Enhancement", "enhance_8k"), ("4K Enhancement", "enhance_4k")],
                vec![
                    ("1080p Enhancement", "enhance_1080p"),
                    ("720p Enhancement", "enhance_720p"),
                ],
                vec![("Original+ (2x)", "enhance_original"), BACK],
            ],
        }
    }
}

/// A runnable image operation selected from a menu.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Fit inside the box.
    Resize { width: u32, height: u32 },
    SmartCrop(CropStyle),
    RemoveBackground,
    GenerateBackground,
    EnhanceResolution(Resolution),
    Convert(OutputFormat),
}

impl Request {
    /// Execute against `source`, returning the written file.
    pub fn run(
        &self,
        backend: &impl ImageBackend,
        settings: &OutputSettings,
        source: &Path,
    ) -> Result<PathBuf, ImageProcessingError> {
        match self {
            Self::Resize { width, height } => {
                imaging::resize(backend, settings, source, *width, *height)
            }
            Self::SmartCrop(style) => imaging::smart_crop(backend, settings, source, style.name()),
            Self::RemoveBackground => imaging::remove_background(backend, settings, source),
            Self::GenerateBackground => imaging::generate_background(backend, settings, source),
            Self::EnhanceResolution(resolution) => {
                imaging::enhance_resolution(backend, settings, source, resolution.name())
            }
            Self::Convert(format) => imaging::convert_format(backend, settings, source, format.name()),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize { width, height } => write!(f, "resize to fit {width}x{height}"),
            Self::SmartCrop(style) => write!(f, "{style} crop"),
            Self::RemoveBackground => f.write_str("remove background"),
            Self::GenerateBackground => f.write_str("generate background"),
            Self::EnhanceResolution(resolution) => write!(f, "enhance to {resolution}"),
            Self::Convert(format) => write!(f, "convert to {format}"),
        }
    }
}

/// What a pressed button means.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Open(Menu),
    Run(Request),
}

/// Resize presets by callback suffix.
fn resize_preset(name: &str) -> Option<(u32, u32)> {
    match name {
        "8k" => Some((7680, 4320)),
        "4k" => Some((3840, 2160)),
        "1080p" => Some((1920, 1080)),
        "720p" => Some((1280, 720)),
        "mobile" => Some((720, 1280)),
        _ => None,
    }
}

/// Map a callback string to an [`Action`].
pub fn parse_callback(data: &str) -> Result<Action, DispatchError> {
    let unknown = || DispatchError::UnknownCallback(data.to_string());

    let action = match data {
        "back" | "back_main" => Action::Open(Menu::Main),
        "resize" => Action::Open(Menu::Resize),
        "crop" => Action::Open(Menu::Crop),
        "convert" => Action::Open(Menu::Convert),
        "enhance" => Action::Open(Menu::Enhance),
        "remove_bg" => Action::Run(Request::RemoveBackground),
        "generate_bg" => Action::Run(Request::GenerateBackground),
        _ => {
            let (kind, arg) = data.split_once('_').ok_or_else(unknown)?;
            let request = match kind {
                "resize" => {
                    let (width, height) = resize_preset(arg).ok_or_else(unknown)?;
                    Request::Resize { width, height }
                }
                "crop" => match CropStyle::parse(arg) {
                    CropStyle::Passthrough(_) => return Err(unknown()),
                    style => Request::SmartCrop(style),
                },
                "enhance" => Request::EnhanceResolution(arg.parse().map_err(|_| unknown())?),
                "convert" if arg != "jpg" => {
                    Request::Convert(arg.parse().map_err(|_| unknown())?)
                }
                _ => return Err(unknown()),
            };
            Action::Run(request)
        }
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    #[test]
    fn menu_callbacks_open_menus() {
        assert_eq!(parse_callback("resize"), Ok(Action::Open(Menu::Resize)));
        assert_eq!(parse_callback("crop"), Ok(Action::Open(Menu::Crop)));
        assert_eq!(parse_callback("convert"), Ok(Action::Open(Menu::Convert)));
        assert_eq!(parse_callback("enhance"), Ok(Action::Open(Menu::Enhance)));
        assert_eq!(parse_callback("back"), Ok(Action::Open(Menu::Main)));
        assert_eq!(parse_callback("back_main"), Ok(Action::Open(Menu::Main)));
    }

    #[test]
    fn resize_presets_map_to_boxes() {
        let cases = [
            ("resize_8k", 7680, 4320),
            ("resize_4k", 3840, 2160),
            ("resize_1080p", 1920, 1080),
            ("resize_720p", 1280, 720),
            ("resize_mobile", 720, 1280),
        ];
        for (callback, width, height) in cases {
            assert_eq!(
                parse_callback(callback),
                Ok(Action::Run(Request::Resize { width, height })),
                "{callback}"
            );
        }
    }

    #[test]
    fn crop_enhance_convert_callbacks() {
        assert_eq!(
            parse_callback("crop_portrait"),
            Ok(Action::Run(Request::SmartCrop(CropStyle::Portrait)))
        );
        assert_eq!(
            parse_callback("enhance_original"),
            Ok(Action::Run(Request::EnhanceResolution(Resolution::Double)))
        );
        assert_eq!(
            parse_callback("convert_webp"),
            Ok(Action::Run(Request::Convert(OutputFormat::WebP)))
        );
        assert_eq!(
            parse_callback("remove_bg"),
            Ok(Action::Run(Request::RemoveBackground))
        );
    }

    #[test]
    fn unknown_callbacks_are_rejected() {
        for bad in [
            "",
            "rotate",
            "resize_5k",
            "crop_circle",
            "convert_bmp",
            "convert_jpg",
            "enhance_16k",
            "Resize",
        ] {
            assert_eq!(
                parse_callback(bad),
                Err(DispatchError::UnknownCallback(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn every_button_parses() {
        for menu in Menu::ALL {
            for row in menu.buttons() {
                assert!(!row.is_empty() && row.len() <= 2);
                for (label, callback) in row {
                    assert!(
                        parse_callback(callback).is_ok(),
                        "{menu:?} button {label:?} has dead callback {callback:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn submenus_lead_back_to_main() {
        for menu in [Menu::Resize, Menu::Crop, Menu::Convert, Menu::Enhance] {
            let has_back = menu
                .buttons()
                .iter()
                .flatten()
                .any(|(_, cb)| parse_callback(cb) == Ok(Action::Open(Menu::Main)));
            assert!(has_back, "{menu:?} has no way back");
        }
    }

    #[test]
    fn run_routes_to_operation() {
        let tmp = TempDir::new().unwrap();
        let settings = OutputSettings::in_dir(tmp.path());
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 4000,
            height: 3000,
        }]);

        let Ok(Action::Run(request)) = parse_callback("resize_mobile") else {
            panic!("expected a runnable request");
        };
        let out = request
            .run(&backend, &settings, Path::new("/in.jpg"))
            .unwrap();
        assert!(out.starts_with(tmp.path()));

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                width: 720,
                height: 540,
                ..
            }
        ));
    }

    #[test]
    fn request_descriptions() {
        assert_eq!(
            Request::Convert(OutputFormat::Png).to_string(),
            "convert to png"
        );
        assert_eq!(
            Request::EnhanceResolution(Resolution::Uhd4k).to_string(),
            "enhance to 4k"
        );
    }
}
