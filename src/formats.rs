//! Supported format catalog and file name helpers
//!
//! Formats are dotted, lower-case extensions (".png"). The catalog mirrors the
//! formats ImageMagick can write; membership is checked by binary search, so the
//! list must stay sorted.

use std::path::Path;

/// Output format that triggers the icon conversion policy
pub const ICON_FORMAT: &str = ".ico";

/// Dotted extensions accepted as conversion input and output (sorted)
pub const SUPPORTED_FORMATS: &[&str] = &[
    ".aai", ".apng", ".art", ".arw", ".avi", ".avif", ".avs", ".bayer", ".bmp", ".bmp2", ".bmp3",
    ".bpg", ".brf", ".cals", ".cin", ".cip", ".clipboard", ".cmyk", ".cmyka", ".cr2", ".crw",
    ".cube", ".cur", ".cut", ".dcm", ".dcr", ".dcx", ".dds", ".debug", ".dib", ".djvu", ".dng",
    ".dot", ".dpx", ".emf", ".epdf", ".epi", ".eps", ".eps2", ".eps3", ".epsf", ".epsi", ".ept",
    ".exr", ".farbfeld", ".fax", ".fits", ".fl32", ".flif", ".fpx", ".ftxt", ".gif", ".gplt",
    ".gray", ".graya", ".hdr", ".heic", ".hpgl", ".hrz", ".html", ".ico", ".info", ".isobrl",
    ".isobrl6", ".j2c", ".j2k", ".jbig", ".jng", ".jp2", ".jpeg", ".jpg", ".jpt", ".json", ".jxl",
    ".jxr", ".kernel", ".m2v", ".man", ".mat", ".miff", ".mng", ".mono", ".mpc", ".mpeg", ".mpr",
    ".mrsid", ".mrw", ".msl", ".mtv", ".mvg", ".nef", ".ora", ".orf", ".otb", ".p7", ".palm",
    ".pam", ".pbm", ".pcd", ".pcds", ".pcl", ".pcx", ".pdb", ".pdf", ".pef", ".pes", ".pfa",
    ".pfb", ".pfm", ".pgm", ".phm", ".picon", ".pict", ".pix", ".png", ".png00", ".png24",
    ".png32", ".png48", ".png64", ".png8", ".pnm", ".pocketmod", ".ppm", ".ps", ".ps2", ".ps3",
    ".psb", ".psd", ".ptif", ".pwp", ".qoi", ".rad", ".raf", ".raw", ".rgb", ".rgb565", ".rgba",
    ".rgf", ".rla", ".rle", ".sct", ".sfw", ".sgi", ".shtml", ".sid", ".sparse-color", ".strimg",
    ".sun", ".svg", ".text", ".tga", ".tiff", ".tim", ".ttf", ".txt", ".ubrl", ".ubrl6", ".uil",
    ".uyvy", ".vicar", ".video", ".viff", ".wbmp", ".wdp", ".webp", ".wmf", ".wpg", ".x", ".x3f",
    ".xbm", ".xcf", ".xpm", ".xwd", ".yaml", ".ycbcr", ".ycbcra", ".yuv",
];

/// Whether a dotted, lower-case format is in the catalog
pub fn is_supported(format: &str) -> bool {
    SUPPORTED_FORMATS.binary_search(&format).is_ok()
}

/// Normalise a client-supplied format: trim, lower-case, ensure a leading dot
///
/// Returns `None` for blank input.
pub fn normalize_format(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{lower}"))
    }
}

/// Dotted, lower-case extension of a file name (`"Cat.PNG"` → `".png"`)
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// File name with its last extension removed (`"a.tar.png"` → `"a.tar"`)
pub fn file_stem(name: &str) -> &str {
    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => &name[..name.len() - ext.len() - 1],
        _ => name,
    }
}

/// Name of the converted file: original stem plus the output format
pub fn target_name(original_name: &str, output_format: &str) -> String {
    format!("{}{}", file_stem(original_name), output_format)
}

/// Reduce a client-supplied file name to its final path component
pub fn sanitize_file_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// MIME type for a converted file
pub fn content_type_for(format: &str) -> String {
    let mime = match format {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".svg" => "image/svg+xml",
        ".ico" | ".cur" => "image/x-icon",
        ".tif" | ".tiff" | ".ptif" => "image/tiff",
        ".pdf" | ".epdf" => "application/pdf",
        ".ps" | ".ps2" | ".ps3" | ".eps" | ".eps2" | ".eps3" | ".epsf" | ".epsi" => {
            "application/postscript"
        }
        ".json" => "application/json",
        ".yaml" => "application/yaml",
        ".html" | ".shtml" => "text/html",
        ".txt" | ".text" | ".ftxt" => "text/plain",
        ".png00" | ".png8" | ".png24" | ".png32" | ".png48" | ".png64" => "image/png",
        other => return format!("image/{}", other.trim_start_matches('.')),
    };
    mime.to_string()
}
