//! Приведение изменений формы к согласованному снапшоту.
//!
//! Сначала изменения вливаются как есть, затем правила применяются по порядку,
//! поздние правила перекрывают ранние на том же поле.

use crate::color::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, TRANSPARENT};
use crate::settings::{
    BackgroundMode, ColorHistory, FieldChanges, FormModes, ForegroundMode, ImageSettings,
    MarginMode, QrOptions, DEFAULT_MARGIN,
};

pub fn normalize(
    delta: &FieldChanges,
    previous: &QrOptions,
    history: &ColorHistory,
) -> (QrOptions, ColorHistory) {
    let mut next = merge_verbatim(delta, previous);
    let mut history = history.clone();

    match delta.foreground_mode {
        Some(ForegroundMode::Default) => next.foreground = DEFAULT_FOREGROUND.to_string(),
        Some(ForegroundMode::Custom) => next.foreground = history.last_custom_foreground.clone(),
        None => {}
    }

    match delta.background_mode {
        Some(BackgroundMode::Transparent) => next.background = TRANSPARENT.to_string(),
        Some(BackgroundMode::Custom) => next.background = history.last_custom_background.clone(),
        None => {}
    }

    if let Some(color) = &delta.foreground {
        let hex = color.resolve();
        next.foreground = hex.clone();
        history.last_custom_foreground = hex;
    }

    if let Some(color) = &delta.background {
        let hex = color.resolve();
        next.background = hex.clone();
        history.last_custom_background = hex;
    }

    // Цвета не должны совпадать, если фон не прозрачный
    if next.background != TRANSPARENT && next.foreground == next.background {
        if next.foreground == DEFAULT_FOREGROUND {
            next.background = DEFAULT_BACKGROUND.to_string();
        } else {
            next.foreground = DEFAULT_FOREGROUND.to_string();
        }
    }

    if delta.margin_mode == Some(MarginMode::Default) {
        next.margin = DEFAULT_MARGIN;
    }

    if delta.embed_image == Some(false) {
        next.image_settings = ImageSettings::disabled();
    }

    if let Some(image) = &delta.image_settings {
        if let Some(width) = image.width {
            next.image_settings.width = width;
            next.image_settings.height = width;
        } else if let Some(height) = image.height {
            next.image_settings.width = height;
            next.image_settings.height = height;
        }
    }

    (next, history)
}

fn merge_verbatim(delta: &FieldChanges, previous: &QrOptions) -> QrOptions {
    let mut next = previous.clone();

    if let Some(content) = &delta.content {
        next.content = content.clone();
    }
    if let Some(size) = delta.size {
        next.size = size;
    }
    if let Some(level) = delta.level {
        next.level = level;
    }
    if let Some(margin) = delta.margin {
        next.margin = margin;
    }
    if let Some(image) = &delta.image_settings {
        if let Some(src) = &image.src {
            next.image_settings.src = src.clone();
        }
        if let Some(excavate) = image.excavate {
            next.image_settings.excavate = excavate;
        }
    }

    next
}

impl FormModes {
    /// Обновить режимы виджетов. Числовые значения при смене режима не пересчитываются.
    pub fn apply(&mut self, delta: &FieldChanges) {
        if let Some(mode) = delta.size_mode {
            self.size = mode;
        }
        if let Some(mode) = delta.foreground_mode {
            self.foreground = mode;
        }
        if let Some(mode) = delta.background_mode {
            self.background = mode;
        }
        if let Some(mode) = delta.margin_mode {
            self.margin = mode;
        }
        if let Some(enabled) = delta.embed_image {
            self.embed_image = enabled;
        }
        if let Some(show) = delta.show_more_options {
            self.show_more_options = show;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorInput, RichColor};
    use crate::settings::{ErrorCorrectionLevel, ImageChanges, SizeMode};

    fn step(
        delta: FieldChanges,
        state: (QrOptions, ColorHistory),
    ) -> (QrOptions, ColorHistory) {
        normalize(&delta, &state.0, &state.1)
    }

    fn initial() -> (QrOptions, ColorHistory) {
        (QrOptions::default(), ColorHistory::default())
    }

    fn raw(hex: &str) -> Option<ColorInput> {
        Some(ColorInput::Raw(hex.to_string()))
    }

    fn assert_invariants(options: &QrOptions) {
        if options.background != TRANSPARENT {
            assert_ne!(options.foreground, options.background);
        }
        assert_eq!(options.image_settings.width, options.image_settings.height);
    }

    #[test]
    fn custom_foreground_survives_default_round_trip() {
        let state = step(
            FieldChanges { foreground_mode: Some(ForegroundMode::Custom), ..Default::default() },
            initial(),
        );
        let state = step(FieldChanges { foreground: raw("#3366FF"), ..Default::default() }, state);
        assert_eq!(state.0.foreground, "#3366ff");

        let state = step(
            FieldChanges { foreground_mode: Some(ForegroundMode::Default), ..Default::default() },
            state,
        );
        assert_eq!(state.0.foreground, "#000000");

        let state = step(
            FieldChanges { foreground_mode: Some(ForegroundMode::Custom), ..Default::default() },
            state,
        );
        assert_eq!(state.0.foreground, "#3366ff");
    }

    #[test]
    fn custom_background_survives_transparent_round_trip() {
        let state = step(
            FieldChanges { background_mode: Some(BackgroundMode::Custom), ..Default::default() },
            initial(),
        );
        assert_eq!(state.0.background, "#ffffff");

        let state = step(
            FieldChanges {
                background: Some(ColorInput::Rich(RichColor { r: 0, g: 128, b: 0, a: 1.0 })),
                ..Default::default()
            },
            state,
        );
        assert_eq!(state.1.last_custom_background, "#008000");

        let state = step(
            FieldChanges { background_mode: Some(BackgroundMode::Transparent), ..Default::default() },
            state,
        );
        assert_eq!(state.0.background, "transparent");

        let state = step(
            FieldChanges { background_mode: Some(BackgroundMode::Custom), ..Default::default() },
            state,
        );
        assert_eq!(state.0.background, "#008000");
    }

    #[test]
    fn collision_flips_foreground_when_background_edited() {
        let state = step(FieldChanges { foreground: raw("#ff0000"), ..Default::default() }, initial());
        let state = step(
            FieldChanges {
                background_mode: Some(BackgroundMode::Custom),
                background: raw("#ff0000"),
                ..Default::default()
            },
            state,
        );

        assert_eq!(state.0.foreground, "#000000");
        assert_eq!(state.0.background, "#ff0000");
        assert_invariants(&state.0);
    }

    #[test]
    fn collision_on_black_flips_background_to_white() {
        let state = step(FieldChanges { background: raw("#000000"), ..Default::default() }, initial());

        assert_eq!(state.0.foreground, "#000000");
        assert_eq!(state.0.background, "#ffffff");
        // история хранит то, что ввёл пользователь
        assert_eq!(state.1.last_custom_background, "#000000");
    }

    #[test]
    fn light_foreground_on_transparent_background_is_kept() {
        let state = step(FieldChanges { foreground: raw("#ffffff"), ..Default::default() }, initial());
        assert_eq!(state.0.foreground, "#ffffff");
        assert_eq!(state.0.background, TRANSPARENT);

        // совпадение с цветом из истории не считается коллизией
        assert_eq!(state.1.last_custom_background, "#ffffff");
        let again = step(FieldChanges::default(), state.clone());
        assert_eq!(again, state);
    }

    #[test]
    fn explicit_color_beats_mode_toggle_in_same_delta() {
        let state = step(
            FieldChanges {
                foreground_mode: Some(ForegroundMode::Default),
                foreground: raw("#00ff00"),
                ..Default::default()
            },
            initial(),
        );
        assert_eq!(state.0.foreground, "#00ff00");
    }

    #[test]
    fn embedded_width_mirrors_into_height_and_disable_resets() {
        let state = step(FieldChanges { embed_image: Some(true), ..Default::default() }, initial());
        assert!(!state.0.image_settings.excavate);

        let state = step(
            FieldChanges {
                image_settings: Some(ImageChanges {
                    src: Some("https://example.com/logo.png".into()),
                    width: Some(40),
                    ..Default::default()
                }),
                ..Default::default()
            },
            state,
        );
        assert_eq!(state.0.image_settings.width, 40);
        assert_eq!(state.0.image_settings.height, 40);

        let state = step(FieldChanges { embed_image: Some(false), ..Default::default() }, state);
        assert_eq!(
            state.0.image_settings,
            ImageSettings { src: String::new(), width: 24, height: 24, excavate: true }
        );
    }

    #[test]
    fn height_mirrors_into_width_and_width_wins() {
        let state = step(
            FieldChanges {
                image_settings: Some(ImageChanges { height: Some(12), ..Default::default() }),
                ..Default::default()
            },
            initial(),
        );
        assert_eq!((state.0.image_settings.width, state.0.image_settings.height), (12, 12));

        let state = step(
            FieldChanges {
                image_settings: Some(ImageChanges {
                    width: Some(30),
                    height: Some(50),
                    ..Default::default()
                }),
                ..Default::default()
            },
            state,
        );
        assert_eq!((state.0.image_settings.width, state.0.image_settings.height), (30, 30));
    }

    #[test]
    fn margin_default_resets_custom_value() {
        let state = step(
            FieldChanges { margin_mode: Some(MarginMode::Custom), margin: Some(17), ..Default::default() },
            initial(),
        );
        assert_eq!(state.0.margin, 17);

        let state = step(
            FieldChanges { margin_mode: Some(MarginMode::Default), margin: Some(30), ..Default::default() },
            state,
        );
        assert_eq!(state.0.margin, 4);
    }

    #[test]
    fn plain_fields_merge_verbatim() {
        let state = step(
            FieldChanges {
                content: Some("hello".into()),
                size_mode: Some(SizeMode::Custom),
                size: Some(300),
                level: Some(ErrorCorrectionLevel::H),
                ..Default::default()
            },
            initial(),
        );
        assert_eq!(state.0.content, "hello");
        assert_eq!(state.0.size, 300);
        assert_eq!(state.0.level, ErrorCorrectionLevel::H);
    }

    #[test]
    fn empty_delta_is_idempotent() {
        let deltas = vec![
            FieldChanges { foreground: raw("#123456"), ..Default::default() },
            FieldChanges { background: raw("#123456"), ..Default::default() },
            FieldChanges { embed_image: Some(false), ..Default::default() },
            FieldChanges { margin: Some(0), ..Default::default() },
        ];

        let mut state = initial();
        for delta in deltas {
            state = step(delta, state);
            assert_invariants(&state.0);
            let again = step(FieldChanges::default(), state.clone());
            assert_eq!(again, state);
        }
    }

    fn image(width: Option<u32>, height: Option<u32>) -> Option<ImageChanges> {
        Some(ImageChanges { width, height, ..Default::default() })
    }

    #[test]
    fn mixed_sequence_keeps_invariants() {
        // (изменение, ожидаемые foreground, background, сторона картинки)
        let table: Vec<(FieldChanges, &str, &str, u32)> = vec![
            (
                FieldChanges { background_mode: Some(BackgroundMode::Custom), ..Default::default() },
                "#000000", "#ffffff", 24,
            ),
            (
                FieldChanges { background: raw("#000000"), ..Default::default() },
                "#000000", "#ffffff", 24,
            ),
            (
                FieldChanges {
                    foreground_mode: Some(ForegroundMode::Custom),
                    foreground: raw("#FFFFFF"),
                    ..Default::default()
                },
                "#000000", "#ffffff", 24,
            ),
            (
                FieldChanges { foreground: raw("#abcdef"), ..Default::default() },
                "#abcdef", "#ffffff", 24,
            ),
            (
                FieldChanges { background: raw("#ABCDEF"), ..Default::default() },
                "#000000", "#abcdef", 24,
            ),
            (
                FieldChanges { background_mode: Some(BackgroundMode::Transparent), ..Default::default() },
                "#000000", TRANSPARENT, 24,
            ),
            (
                FieldChanges { foreground_mode: Some(ForegroundMode::Custom), ..Default::default() },
                "#abcdef", TRANSPARENT, 24,
            ),
            (
                FieldChanges { background_mode: Some(BackgroundMode::Custom), ..Default::default() },
                "#000000", "#abcdef", 24,
            ),
            (
                FieldChanges {
                    embed_image: Some(true),
                    image_settings: Some(ImageChanges {
                        src: Some("https://example.com/logo.png".into()),
                        width: Some(40),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                "#000000", "#abcdef", 40,
            ),
            (
                FieldChanges { image_settings: image(None, Some(60)), ..Default::default() },
                "#000000", "#abcdef", 60,
            ),
            (
                FieldChanges { embed_image: Some(false), ..Default::default() },
                "#000000", "#abcdef", 24,
            ),
            (
                FieldChanges { image_settings: image(Some(10), Some(90)), ..Default::default() },
                "#000000", "#abcdef", 10,
            ),
            (
                FieldChanges { foreground_mode: Some(ForegroundMode::Default), ..Default::default() },
                "#000000", "#abcdef", 10,
            ),
        ];

        let mut state = initial();
        for (i, (delta, foreground, background, side)) in table.into_iter().enumerate() {
            state = step(delta, state);
            assert_invariants(&state.0);
            assert_eq!(state.0.foreground, foreground, "step {}", i);
            assert_eq!(state.0.background, background, "step {}", i);
            assert_eq!(state.0.image_settings.width, side, "step {}", i);

            let again = step(FieldChanges::default(), state.clone());
            assert_eq!(again, state, "step {}", i);
        }

        assert_eq!(state.1.last_custom_foreground, "#abcdef");
        assert_eq!(state.1.last_custom_background, "#abcdef");
        assert!(state.0.image_settings.excavate);
        assert!(state.0.image_settings.src.is_empty());
    }

    #[test]
    fn modes_follow_delta_without_touching_values() {
        let mut modes = FormModes::default();
        modes.apply(&FieldChanges {
            size_mode: Some(SizeMode::Custom),
            background_mode: Some(BackgroundMode::Custom),
            show_more_options: Some(true),
            ..Default::default()
        });
        assert_eq!(modes.size, SizeMode::Custom);
        assert_eq!(modes.background, BackgroundMode::Custom);
        assert_eq!(modes.foreground, ForegroundMode::Default);
        assert!(modes.show_more_options);
        assert!(!modes.embed_image);
    }
}
