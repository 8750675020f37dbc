use std::borrow::Cow;

use url::Url;

use crate::models::{ResourceKind, ResourceRef};

/// Recovers the provider id and kind from a stored delivery URL.
///
/// Expects `/<cloud>/<kind>/<delivery>/[...]/[v<digits>/]<public id>`.
/// Returns `None` for anything that does not fit that shape.
pub fn extract(stored: Option<&str>) -> Option<ResourceRef> {
    let stored = stored?.trim();
    if stored.is_empty() {
        return None;
    }

    let url = Url::parse(stored).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    // [cloud, kind, delivery, rest..]
    if segments.len() < 4 {
        return None;
    }
    let kind = ResourceKind::parse(segments[1])?;
    let rest = &segments[3..];

    let id_segments = match rest.iter().position(|s| is_version(s)) {
        Some(version) => &rest[version + 1..],
        None => rest,
    };
    if id_segments.is_empty() {
        return None;
    }

    let decoded = id_segments
        .iter()
        .map(|s| urlencoding::decode(s).ok().map(Cow::into_owned))
        .collect::<Option<Vec<_>>>()?;
    let mut storage_id = decoded.join("/");

    if kind != ResourceKind::Raw {
        storage_id = strip_extension(&storage_id).to_string();
    }
    if storage_id.is_empty() {
        return None;
    }

    Some(ResourceRef { storage_id, kind })
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn strip_extension(id: &str) -> &str {
    let file_start = id.rfind('/').map_or(0, |slash| slash + 1);
    match id[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &id[..file_start + dot],
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_resources_keep_their_extension() {
        let resource = extract(Some(
            "https://res.cloudinary.com/demo/raw/upload/v1712345678/resumes/cs101_avery.pdf",
        ))
        .unwrap();
        assert_eq!(resource.kind, ResourceKind::Raw);
        assert_eq!(resource.storage_id, "resumes/cs101_avery.pdf");
    }

    #[test]
    fn image_resources_drop_their_extension() {
        let resource = extract(Some(
            "https://res.cloudinary.com/demo/image/upload/v1/resumes/2026/jules.moreno.pdf",
        ))
        .unwrap();
        assert_eq!(resource.kind, ResourceKind::Image);
        assert_eq!(resource.storage_id, "resumes/2026/jules.moreno");
    }

    #[test]
    fn transformations_before_the_version_are_skipped() {
        let resource = extract(Some(
            "https://res.cloudinary.com/demo/image/upload/fl_attachment,w_200/v99/resumes/k.png",
        ))
        .unwrap();
        assert_eq!(resource.storage_id, "resumes/k");
    }

    #[test]
    fn unversioned_urls_use_the_remaining_path() {
        let resource =
            extract(Some("https://res.cloudinary.com/demo/raw/upload/resumes/a%20b.docx")).unwrap();
        assert_eq!(resource.storage_id, "resumes/a b.docx");
    }

    #[test]
    fn malformed_escapes_stay_literal() {
        let plus = extract(Some("https://x/demo/raw/upload/v1/resumes/a%+41.pdf")).unwrap();
        assert_eq!(plus.storage_id, "resumes/a%+41.pdf");

        let bad_hex = extract(Some("https://x/demo/raw/upload/v1/resumes/100%zz.pdf")).unwrap();
        assert_eq!(bad_hex.storage_id, "resumes/100%zz.pdf");

        let truncated = extract(Some("https://x/demo/raw/upload/v1/resumes/cv%2")).unwrap();
        assert_eq!(truncated.storage_id, "resumes/cv%2");
    }

    #[test]
    fn escapes_that_are_not_utf8_are_absent() {
        assert_eq!(extract(Some("https://x/demo/raw/upload/v1/resumes/%ff.pdf")), None);
    }

    #[test]
    fn unusable_references_are_absent() {
        assert_eq!(extract(None), None);
        assert_eq!(extract(Some("   ")), None);
        assert_eq!(extract(Some("not a url")), None);
        assert_eq!(extract(Some("ftp://res.cloudinary.com/demo/raw/upload/v1/a")), None);
        assert_eq!(extract(Some("https://res.cloudinary.com/demo/pdf/upload/v1/a")), None);
        assert_eq!(extract(Some("https://res.cloudinary.com/demo/raw/upload/v1")), None);
    }

    #[test]
    fn prefix_check_guards_the_namespace() {
        let inside = extract(Some("https://x/demo/raw/upload/v1/resumes/a.pdf")).unwrap();
        let outside = extract(Some("https://x/demo/raw/upload/v1/avatars/a.png")).unwrap();
        assert!(inside.within("resumes/"));
        assert!(!outside.within("resumes/"));
    }
}
