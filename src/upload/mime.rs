use std::path::Path;

/// Content type for an upload, decided by file extension alone.
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

/// File name sent in the multipart `image` part.
pub fn upload_file_name(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "image.jpg",
        _ => "image.png",
    }
}
