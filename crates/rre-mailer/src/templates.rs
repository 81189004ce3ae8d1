//! French notification templates for the two registration emails.

use rre_types::models::Registration;

use crate::OutboundEmail;

struct EventDetails {
    name: &'static str,
    date: &'static str,
    location: &'static str,
}

fn event_details(event_id: &str) -> EventDetails {
    match event_id {
        "tanger" => EventDetails {
            name: "Tanger",
            date: "22 Septembre 2025",
            location: "Tanger, Maroc",
        },
        "fes" => EventDetails {
            name: "Fes",
            date: "29 Septembre 2025",
            location: "Fes, Maroc",
        },
        _ => EventDetails {
            name: "Casablanca",
            date: "15 Septembre 2025",
            location: "Casablanca, Maroc",
        },
    }
}

/// Sent right after a successful submission.
pub fn confirmation_email(registration: &Registration) -> OutboundEmail {
    let event = event_details(&registration.selected_event);
    OutboundEmail {
        to: registration.email.clone(),
        subject: "Confirmation de votre inscription - Rencontres Régionales EXPORT".into(),
        html: format!(
            "<h2>Merci pour votre inscription</h2>\
             <p>Bonjour {},</p>\
             <p>Nous avons bien reçu l'inscription de <strong>{}</strong> \
             aux Rencontres Régionales EXPORT de {}.</p>\
             <p>Date : {}<br>Lieu : {}</p>\
             <p>Votre inscription sera examinée par notre équipe. Vous \
             recevrez vos identifiants de connexion une fois votre \
             participation validée.</p>",
            registration.representative_name,
            registration.company_name,
            event.name,
            event.date,
            event.location,
        ),
    }
}

/// Sent after an admin validates the registration; carries the issued
/// credential. Expects `user_password` to be set.
pub fn credentials_email(registration: &Registration) -> OutboundEmail {
    let event = event_details(&registration.selected_event);
    let password = registration.user_password.as_deref().unwrap_or_default();
    OutboundEmail {
        to: registration.email.clone(),
        subject: "Validation de votre inscription - Rencontres Régionales EXPORT".into(),
        html: format!(
            "<h2>Votre inscription est validée</h2>\
             <p>Bonjour {},</p>\
             <p>Votre participation aux Rencontres Régionales EXPORT de {} \
             ({}, {}) est confirmée.</p>\
             <p>Vos identifiants de connexion :</p>\
             <p>Email : <strong>{}</strong><br>\
             Mot de passe : <strong>{}</strong></p>",
            registration.representative_name,
            event.name,
            event.date,
            event.location,
            registration.email,
            password,
        ),
    }
}
