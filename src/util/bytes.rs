//! Upload limits rendered for the composer hint and the too-large toast.

const UNITS: [(&str, u64); 3] = [("GiB", 1 << 30), ("MiB", 1 << 20), ("KiB", 1 << 10)];

/// Largest IEC unit that fits, rounded to one decimal that is dropped when
/// it is zero: `10485760` is `10 MiB`, `1536` is `1.5 KiB`.
pub fn human_size(bytes: u64) -> String {
    let Some((unit, scale)) = UNITS.into_iter().find(|(_, scale)| bytes >= *scale) else {
        return format!("{bytes} B");
    };

    let scale = u128::from(scale);
    let tenths = (u128::from(bytes) * 10 + scale / 2) / scale;
    match tenths % 10 {
        0 => format!("{} {unit}", tenths / 10),
        rest => format!("{}.{rest} {unit}", tenths / 10),
    }
}
