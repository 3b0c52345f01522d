//! Note names, chord and scale tables used by chord tokens

/// Semitone offset of a note name (`C` = 0) with an optional `#` or `b`
pub fn semitone(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let base = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let offset = match chars.next() {
        None => 0,
        Some('#') => 1,
        Some('b') => -1,
        Some(_) => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    // Cb and B# are not in the table
    let value = base + offset;
    if !(0..12).contains(&value) {
        return None;
    }
    Some(value)
}

/// MIDI number of a chord root, `C` = 60 through `B` = 71
pub fn root_midi(name: &str) -> Option<f64> {
    semitone(name).map(|s| 60.0 + s as f64)
}

/// MIDI number of a note with an octave, so `C4` = 60 and `A4` = 69
pub fn midi_note(name: &str, octave: u32) -> Option<f64> {
    semitone(name).map(|s| 12.0 + 12.0 * octave as f64 + s as f64)
}

fn triad(name: &str) -> Option<&'static [i32]> {
    match name {
        "ma" => Some(&[0, 4, 7]),
        "mi" => Some(&[0, 3, 7]),
        "di" => Some(&[0, 3, 6]),
        "au" => Some(&[0, 4, 8]),
        "su" => Some(&[0, 5, 7]),
        _ => None,
    }
}

fn mode(name: &str) -> Option<&'static [i32]> {
    match name {
        "ion" | "maj" => Some(&[0, 2, 4, 5, 7, 9, 11]),
        "dor" => Some(&[0, 2, 3, 5, 7, 9, 10]),
        "phr" => Some(&[0, 1, 3, 5, 7, 8, 10]),
        "lyd" => Some(&[0, 2, 4, 6, 7, 9, 11]),
        "mix" => Some(&[0, 2, 4, 5, 7, 9, 10]),
        "aeo" | "min" => Some(&[0, 2, 3, 5, 7, 8, 10]),
        "loc" => Some(&[0, 1, 3, 5, 6, 8, 10]),
        "hmi" => Some(&[0, 2, 3, 5, 7, 8, 11]),
        "mmi" => Some(&[0, 2, 3, 5, 7, 9, 11]),
        "hma" => Some(&[0, 2, 4, 5, 7, 8, 11]),
        "pen" => Some(&[0, 2, 4, 7, 9]),
        "mpe" => Some(&[0, 3, 5, 7, 10]),
        "pro" => Some(&[0, 2, 4, 6, 11]),
        "rit" => Some(&[0, 2, 5, 7, 9]),
        "egy" => Some(&[0, 2, 5, 7, 10]),
        "kum" => Some(&[0, 2, 3, 7, 9]),
        "hir" => Some(&[0, 2, 3, 7, 8]),
        "iwa" => Some(&[0, 1, 5, 6, 10]),
        "chi" => Some(&[0, 4, 6, 7, 11]),
        "ind" => Some(&[0, 4, 5, 7, 10]),
        "pel" => Some(&[0, 1, 3, 7, 8]),
        "scr" => Some(&[0, 1, 4, 7, 9]),
        "who" => Some(&[0, 2, 4, 6, 8, 10]),
        "aug" => Some(&[0, 3, 4, 7, 8, 11]),
        "blu" => Some(&[0, 3, 5, 6, 7, 10]),
        "dim" => Some(&[0, 2, 3, 5, 6, 8, 9, 11]),
        "chr" => Some(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
        "spa" => Some(&[0, 1, 4, 5, 7, 8, 10]),
        "enm" => Some(&[0, 1, 4, 6, 8, 10, 11]),
        "bar" => Some(&[0, 2, 4, 5, 7, 8, 10]),
        "sup" => Some(&[0, 1, 3, 4, 6, 8, 10]),
        "hun" => Some(&[0, 2, 3, 6, 7, 8, 11]),
        "rom" => Some(&[0, 2, 3, 6, 7, 9, 10]),
        "nea" => Some(&[0, 1, 3, 5, 7, 8, 11]),
        _ => None,
    }
}

/// Intervals of a triad or mode
pub fn intervals(kind: &str) -> Option<&'static [i32]> {
    triad(kind).or_else(|| mode(kind))
}

/// Intervals added by an extension. A plain `7` is the major seventh on
/// major and augmented triads and the minor seventh everywhere else.
pub fn extension(kind: &str, ext: &str) -> Option<&'static [i32]> {
    match ext {
        "6" => Some(&[9]),
        "7" if matches!(kind, "ma" | "au") => Some(&[11]),
        "7" => Some(&[10]),
        "#7" => Some(&[11]),
        "b9" => Some(&[1]),
        "9" => Some(&[2]),
        "11" => Some(&[5]),
        "#11" => Some(&[6]),
        "13" => Some(&[9]),
        "#13" => Some(&[10]),
        _ => None,
    }
}

/// MIDI notes of `root` + `kind` + optional extension
pub fn chord(root: &str, kind: &str, ext: Option<&str>) -> Option<Vec<f64>> {
    let base = root_midi(root)?;
    let mut steps = intervals(kind)?.to_vec();
    if let Some(ext) = ext {
        steps.extend_from_slice(extension(kind, ext)?);
    }
    Some(steps.into_iter().map(|s| base + s as f64).collect())
}

/// Repeat `notes` up the octaves until there are `length` of them
pub fn expand(notes: &[f64], length: usize) -> Vec<f64> {
    if notes.is_empty() {
        return Vec::new();
    }
    (0..length)
        .map(|i| notes[i % notes.len()] + 12.0 * (i / notes.len()) as f64)
        .collect()
}
