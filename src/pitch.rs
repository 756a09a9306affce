//! Note names and frequencies for the reference tone.
//!
//! Scientific pitch notation with equal temperament, A4 = 440 Hz (MIDI 69).

use crate::{
    error::{MetronomeError, Result},
    voices::tone::{MAX_TONE_HZ, MIN_TONE_HZ},
};

pub const A4_HZ: f32 = 440.0;
pub const A4_MIDI: i32 = 69;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Convert a (possibly fractional) MIDI note number to Hz.
pub fn midi_to_frequency(note: f32) -> f32 {
    A4_HZ * 2.0_f32.powf((note - A4_MIDI as f32) / 12.0)
}

/// Convert Hz to a fractional MIDI note number.
pub fn frequency_to_midi(frequency: f32) -> f32 {
    A4_MIDI as f32 + 12.0 * (frequency / A4_HZ).log2()
}

/// Shift a frequency by a number of semitones.
pub fn transpose(frequency: f32, semitones: i32) -> f32 {
    frequency * 2.0_f32.powf(semitones as f32 / 12.0)
}

/// Parse a note name to a MIDI note number: a letter, any number of `#` or
/// `b` accidentals, and an octave (4 when omitted). `C4` is 60.
pub fn parse_note_name(name: &str) -> Result<i32> {
    let invalid = || MetronomeError::InvalidNote(name.to_string());
    let trimmed = name.trim();

    let mut chars = trimmed.chars().peekable();
    let base = match chars.next().ok_or_else(invalid)?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };

    let mut accidental = 0;
    while let Some(&c) = chars.peek() {
        match c {
            '#' | '♯' => accidental += 1,
            'b' | '♭' => accidental -= 1,
            _ => break,
        }
        chars.next();
    }

    let octave_str: String = chars.collect();
    let octave: i32 = if octave_str.is_empty() {
        4
    } else {
        octave_str.parse().map_err(|_| invalid())?
    };
    if !(-1..=9).contains(&octave) {
        return Err(invalid());
    }

    Ok((octave + 1) * 12 + base + accidental)
}

/// Frequency of a note name such as `A4`, `C#3` or `Bb2`.
pub fn note_to_frequency(name: &str) -> Result<f32> {
    parse_note_name(name).map(|midi| midi_to_frequency(midi as f32))
}

/// Accept either a plain frequency (`"440"`, `"261.6hz"`) or a note name.
/// The result must lie in the audible range the tone generator supports.
pub fn parse_tone(input: &str) -> Result<f32> {
    let trimmed = input.trim();
    let numeric = trimmed
        .strip_suffix("Hz")
        .or_else(|| trimmed.strip_suffix("hz"))
        .unwrap_or(trimmed)
        .trim();

    let frequency = match numeric.parse::<f32>() {
        Ok(hz) => hz,
        Err(_) => note_to_frequency(trimmed)?,
    };

    if frequency.is_finite() && (MIN_TONE_HZ..=MAX_TONE_HZ).contains(&frequency) {
        Ok(frequency)
    } else {
        Err(MetronomeError::InvalidNote(input.to_string()))
    }
}

/// Nearest note to a frequency and its deviation in cents, e.g. `("A4", 0)`.
pub fn nearest_note(frequency: f32) -> (String, i32) {
    let midi = frequency_to_midi(frequency);
    let nearest = midi.round();
    let cents = ((midi - nearest) * 100.0).round() as i32;

    let nearest = nearest as i32;
    let name = NOTE_NAMES[nearest.rem_euclid(12) as usize];
    let octave = nearest.div_euclid(12) - 1;
    (format!("{name}{octave}"), cents)
}
