//! Validation helpers for DTOs and upload gating.

use validator::ValidationError;

use crate::config::UploadPolicy;

/// Validates that a declared mass is a positive, finite number of grams.
pub fn validate_mass(mass_grams: f64) -> Result<(), ValidationError> {
    if !mass_grams.is_finite() || mass_grams <= 0.0 {
        let mut err = ValidationError::new("mass_positive");
        err.message = Some("Mass must be a positive number of grams".into());
        return Err(err);
    }
    Ok(())
}

/// Gate applied to a model file before a submission reaches the registry.
///
/// Checks the size ceiling first, then the CAD extension allow-list. The
/// extension match is case-insensitive.
pub fn validate_model_file(
    policy: &UploadPolicy,
    file_name: &str,
    file_size_bytes: u64,
) -> Result<(), ValidationError> {
    if file_size_bytes > policy.max_size_bytes {
        let mut err = ValidationError::new("file_too_large");
        err.message = Some(
            format!(
                "File size exceeds the {} MB limit",
                policy.max_size_bytes / (1024 * 1024)
            )
            .into(),
        );
        return Err(err);
    }

    let lowered = file_name.to_lowercase();
    if !policy
        .allowed_extensions
        .iter()
        .any(|extension| lowered.ends_with(extension.as_str()))
    {
        let mut err = ValidationError::new("file_extension");
        err.message = Some(
            format!(
                "Upload a CAD file ({})",
                policy.allowed_extensions.join(", ")
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Gate applied to a drawing upload before it lands on the shared record.
pub fn validate_drawing_media_type(
    allowed: &[String],
    media_type: &str,
) -> Result<(), ValidationError> {
    if !allowed.iter().any(|candidate| candidate == media_type) {
        let mut err = ValidationError::new("drawing_media_type");
        err.message =
            Some(format!("Drawing must be one of: {}", allowed.join(", ")).into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy {
            max_size_bytes: 50 * 1024 * 1024,
            allowed_extensions: [".step", ".iges", ".sldprt", ".prt", ".dwg", ".x_t"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    #[test]
    fn test_validate_mass() {
        assert!(validate_mass(120.5).is_ok());
        assert!(validate_mass(0.001).is_ok());
        assert!(validate_mass(0.0).is_err());
        assert!(validate_mass(-3.0).is_err());
        assert!(validate_mass(f64::NAN).is_err());
        assert!(validate_mass(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_model_file_accepts_cad_extensions() {
        let policy = policy();
        assert!(validate_model_file(&policy, "bracket.step", 1024).is_ok());
        assert!(validate_model_file(&policy, "BRACKET.STEP", 1024).is_ok()); // case-insensitive
        assert!(validate_model_file(&policy, "part.x_t", 1024).is_ok());
    }

    #[test]
    fn test_validate_model_file_rejects_other_extensions() {
        let policy = policy();
        assert!(validate_model_file(&policy, "bracket.stl", 1024).is_err());
        assert!(validate_model_file(&policy, "bracket", 1024).is_err());
        assert!(validate_model_file(&policy, "notes.txt", 1024).is_err());
    }

    #[test]
    fn test_validate_model_file_size_ceiling() {
        let policy = policy();
        assert!(validate_model_file(&policy, "bracket.step", 50 * 1024 * 1024).is_ok()); // at limit
        assert!(validate_model_file(&policy, "bracket.step", 50 * 1024 * 1024 + 1).is_err());
    }

    #[test]
    fn test_validate_drawing_media_type() {
        let allowed: Vec<String> = ["image/png", "application/pdf"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert!(validate_drawing_media_type(&allowed, "image/png").is_ok());
        assert!(validate_drawing_media_type(&allowed, "image/gif").is_err());
        assert!(validate_drawing_media_type(&allowed, "").is_err());
    }
}
