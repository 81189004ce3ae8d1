use axum::{Json, extract::State};
use rand::Rng;
use tracing::{info, warn};

use rre_mailer::templates;
use rre_types::activities::{ActivityOption, find_activity};
use rre_types::api::{RegisterRequest, ValidateRequest, ValidateResponse};
use rre_types::models::{NewRegistration, Registration};

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

const PASSWORD_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";
const PASSWORD_LEN: usize = 10;

/// POST /register — validate, persist the registration plus its activity
/// attachments, and fire off the confirmation email without waiting on it.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<Registration>> {
    let (new_registration, activities) = validate_submission(&req)?;

    // Pre-insert existence check; the UNIQUE constraint stays as a backstop
    // against the race between two concurrent submissions.
    let st = state.clone();
    let email = req.email.clone();
    if blocking(move || st.db.email_exists(&email)).await? {
        return Err(ApiError::Conflict(
            "Cette adresse email est déjà utilisée".into(),
        ));
    }

    let st = state.clone();
    let id = blocking(move || st.db.create_registration(&new_registration, &activities)).await?;

    let st = state.clone();
    let registration = blocking(move || st.db.get_registration(id))
        .await?
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("Registration {id} vanished")))?;

    info!(id, email = %registration.email, "Registration submitted");

    // Fire-and-forget: a failed confirmation never blocks the submission.
    let mailer = state.mailer.clone();
    let email = templates::confirmation_email(&registration);
    tokio::spawn(async move {
        if let Err(e) = mailer.send(email).await {
            warn!("Confirmation email failed: {e:#}");
        }
    });

    Ok(Json(registration))
}

/// GET /registrations — every registration with activities, for the admin
/// console.
pub async fn list_registrations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Registration>>> {
    let registrations = blocking(move || state.db.list_registrations()).await?;
    Ok(Json(registrations))
}

/// POST /validate-registration — one-way Submitted→Validated transition.
/// Issues a fresh display credential on every call and reports the
/// credential email's outcome as an advisory flag.
pub async fn validate_registration(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    let password = generate_password();

    let st = state.clone();
    let id = req.registration_id;
    let registration = blocking(move || st.db.mark_validated(id, &password))
        .await?
        .ok_or_else(|| ApiError::NotFound("Inscription introuvable".into()))?;

    let email_sent = match state
        .mailer
        .send(templates::credentials_email(&registration))
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(id, "Credential email failed: {e:#}");
            false
        }
    };

    info!(id, email_sent, "Registration validated");
    Ok(Json(ValidateResponse {
        registration,
        email_sent,
    }))
}

fn validate_submission(
    req: &RegisterRequest,
) -> Result<(NewRegistration, Vec<ActivityOption>), ApiError> {
    let required = [
        ("companyName", &req.company_name),
        ("companySize", &req.company_size),
        ("address", &req.address),
        ("representativeName", &req.representative_name),
        ("position", &req.position),
        ("email", &req.email),
        ("phone", &req.phone),
        ("selectedEvent", &req.selected_event),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("Le champ {field} est requis")));
        }
    }

    if !email_is_valid(&req.email) {
        return Err(ApiError::Validation("Format d'email invalide".into()));
    }

    if req.selected_activities.is_empty() {
        return Err(ApiError::Validation(
            "Veuillez sélectionner au moins une activité".into(),
        ));
    }
    if req.selected_activities.len() > 3 {
        return Err(ApiError::Validation("Maximum 3 activités autorisées".into()));
    }

    let mut activities = Vec::with_capacity(req.selected_activities.len());
    for id in &req.selected_activities {
        let activity = find_activity(id)
            .ok_or_else(|| ApiError::Validation(format!("Activité inconnue: {id}")))?;
        if activities.contains(&activity) {
            return Err(ApiError::Validation(format!("Activité en double: {id}")));
        }
        activities.push(activity);
    }

    if !req.accept_terms {
        return Err(ApiError::Validation(
            "Vous devez accepter les conditions d'utilisation".into(),
        ));
    }

    Ok((
        NewRegistration {
            company_name: req.company_name.clone(),
            company_size: req.company_size.clone(),
            address: req.address.clone(),
            representative_name: req.representative_name.clone(),
            position: req.position.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            selected_event: req.selected_event.clone(),
            additional_info: req.additional_info.clone(),
            accept_terms: req.accept_terms,
        },
        activities,
    ))
}

fn email_is_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// 10 characters, uniform over letters, digits and symbols. A display
/// credential, not a security-grade secret.
fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| PASSWORD_CHARS[rng.random_range(0..PASSWORD_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            company_name: "Acme SARL".into(),
            selected_activities: vec!["textile".into(), "broderie".into()],
            company_size: "10-50".into(),
            address: "Casablanca".into(),
            representative_name: "Jane Alaoui".into(),
            position: "Directrice".into(),
            email: "jane@acme.ma".into(),
            phone: "+212600000000".into(),
            selected_event: "casablanca".into(),
            additional_info: String::new(),
            accept_terms: true,
        }
    }

    #[test]
    fn password_has_len_and_charset() {
        for _ in 0..50 {
            let pw = generate_password();
            assert_eq!(pw.chars().count(), PASSWORD_LEN);
            assert!(pw.bytes().all(|b| PASSWORD_CHARS.contains(&b)));
        }
    }

    #[test]
    fn valid_submission_resolves_catalog_labels() {
        let (reg, activities) = validate_submission(&request()).unwrap();
        assert_eq!(reg.email, "jane@acme.ma");
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[1].label, "Broderie");
    }

    #[test]
    fn missing_field_is_tagged() {
        let mut req = request();
        req.company_name = "  ".into();
        let err = validate_submission(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("companyName")));
    }

    #[test]
    fn activity_count_bounds() {
        let mut req = request();
        req.selected_activities.clear();
        assert!(matches!(
            validate_submission(&req).unwrap_err(),
            ApiError::Validation(_)
        ));

        req.selected_activities = vec![
            "textile".into(),
            "maille".into(),
            "denim".into(),
            "flou".into(),
        ];
        assert!(matches!(
            validate_submission(&req).unwrap_err(),
            ApiError::Validation(ref m) if m.contains("Maximum 3")
        ));
    }

    #[test]
    fn unknown_and_duplicate_activities_rejected() {
        let mut req = request();
        req.selected_activities = vec!["soudure".into()];
        assert!(matches!(
            validate_submission(&req).unwrap_err(),
            ApiError::Validation(ref m) if m.contains("inconnue")
        ));

        req.selected_activities = vec!["textile".into(), "textile".into()];
        assert!(matches!(
            validate_submission(&req).unwrap_err(),
            ApiError::Validation(ref m) if m.contains("double")
        ));
    }

    #[test]
    fn terms_must_be_accepted() {
        let mut req = request();
        req.accept_terms = false;
        assert!(matches!(
            validate_submission(&req).unwrap_err(),
            ApiError::Validation(ref m) if m.contains("conditions")
        ));
    }

    #[test]
    fn email_shape() {
        assert!(email_is_valid("jane@acme.ma"));
        assert!(!email_is_valid("jane@acme"));
        assert!(!email_is_valid("jane acme@x.ma"));
        assert!(!email_is_valid("@acme.ma"));
        assert!(!email_is_valid("jane@.ma"));
        assert!(!email_is_valid("jane@acme.ma@twice"));
    }
}
