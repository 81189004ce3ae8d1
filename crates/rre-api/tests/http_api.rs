use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use rre_api::storage::MediaStore;
use rre_api::{AppStateInner, router};
use rre_db::Database;
use rre_mailer::Mailer;

async fn app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaStore::new(dir.path().to_path_buf()).await.unwrap();
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        mailer: Mailer::Log,
        media,
    });
    (router(state), dir)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn registration_payload(email: &str) -> Value {
    json!({
        "companyName": "Acme SARL",
        "selectedActivities": ["textile", "broderie"],
        "companySize": "10-50",
        "address": "12 rue des Tanneurs, Casablanca",
        "representativeName": "Jane Alaoui",
        "position": "Directrice export",
        "email": email,
        "phone": "+212600000000",
        "selectedEvent": "casablanca",
        "additionalInfo": "",
        "acceptTerms": true
    })
}

/// Register-and-validate helper; returns (registration id, issued password).
async fn validated_user(app: &Router, email: &str) -> (i64, String) {
    let (status, created) =
        call(app, "POST", "/register", Some(registration_payload(email))).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();

    let (status, validated) = call(
        app,
        "POST",
        "/validate-registration",
        Some(json!({ "registrationId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let password = validated["registration"]["userPassword"]
        .as_str()
        .unwrap()
        .to_string();
    (id, password)
}

#[tokio::test]
async fn registration_lifecycle() {
    let (app, _dir) = app().await;

    let (status, created) = call(
        &app,
        "POST",
        "/register",
        Some(registration_payload("jane@acme.ma")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["companyName"], "Acme SARL");
    assert_eq!(created["isValidated"], false);
    assert!(created["validatedAt"].is_null());
    let labels: Vec<&str> = created["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Textile", "Broderie"]);
    let id = created["id"].as_i64().unwrap();

    // Same email, case-sensitive conflict.
    let (status, conflict) = call(
        &app,
        "POST",
        "/register",
        Some(registration_payload("jane@acme.ma")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"], "Cette adresse email est déjà utilisée");

    // Admin listing sees the submission.
    let (status, listed) = call(&app, "GET", "/registrations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Validation issues a 10-character credential and reports the email.
    let (status, validated) = call(
        &app,
        "POST",
        "/validate-registration",
        Some(json!({ "registrationId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validated["emailSent"], true);
    assert_eq!(validated["registration"]["isValidated"], true);
    assert!(!validated["registration"]["validatedAt"].is_null());
    let password = validated["registration"]["userPassword"].as_str().unwrap();
    assert_eq!(password.chars().count(), 10);

    // Login with the issued credential; the projection hides it.
    let (status, user) = call(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": "jane@acme.ma", "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], id);
    assert_eq!(user["companyName"], "Acme SARL");
    assert!(user.get("userPassword").is_none());

    let (status, _) = call(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": "jane@acme.ma", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_rejects_bad_submissions() {
    let (app, _dir) = app().await;

    let mut no_activities = registration_payload("a@x.ma");
    no_activities["selectedActivities"] = json!([]);
    let (status, body) = call(&app, "POST", "/register", Some(no_activities)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("activité"));

    let mut too_many = registration_payload("a@x.ma");
    too_many["selectedActivities"] = json!(["textile", "maille", "denim", "flou"]);
    let (status, body) = call(&app, "POST", "/register", Some(too_many)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Maximum 3"));

    let mut blank_company = registration_payload("a@x.ma");
    blank_company["companyName"] = json!("  ");
    let (status, body) = call(&app, "POST", "/register", Some(blank_company)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("companyName"));

    let mut no_terms = registration_payload("a@x.ma");
    no_terms["acceptTerms"] = json!(false);
    let (status, _) = call(&app, "POST", "/register", Some(no_terms)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_email = registration_payload("not-an-email");
    bad_email["email"] = json!("not-an-email");
    let (status, body) = call(&app, "POST", "/register", Some(bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Format d'email invalide");
}

#[tokio::test]
async fn validating_unknown_registration_is_404() {
    let (app, _dir) = app().await;
    let (status, body) = call(
        &app,
        "POST",
        "/validate-registration",
        Some(json!({ "registrationId": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Inscription introuvable");
}

#[tokio::test]
async fn wall_post_lifecycle_with_ownership() {
    let (app, _dir) = app().await;
    let (author, _) = validated_user(&app, "author@x.ma").await;
    let (other, _) = validated_user(&app, "other@x.ma").await;

    let (status, post) = call(
        &app,
        "POST",
        "/wall/posts",
        Some(json!({ "content": "Bonjour le mur", "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let post_id = post["id"].as_i64().unwrap();
    assert_eq!(post["authorName"], "Acme SARL");

    // Like toggling alternates.
    for expected in [true, false, true] {
        let (status, like) = call(
            &app,
            "POST",
            "/wall/likes",
            Some(json!({ "targetId": post_id, "userId": other, "kind": "post" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(like["liked"], expected);
    }
    let (_, liked) = call(
        &app,
        "GET",
        &format!("/wall/likes?postId={post_id}&userId={other}"),
        None,
    )
    .await;
    assert_eq!(liked["liked"], true);

    // Comments.
    let (status, comment) = call(
        &app,
        "POST",
        "/wall/comments",
        Some(json!({ "postId": post_id, "userId": other, "content": "Bienvenue !" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = comment["id"].as_i64().unwrap();

    let (_, comments) = call(
        &app,
        "GET",
        &format!("/wall/comments?postId={post_id}"),
        None,
    )
    .await;
    assert_eq!(comments.as_array().unwrap().len(), 1);

    // Listing reflects counts.
    let (_, posts) = call(&app, "GET", "/wall/posts", None).await;
    let listed = &posts.as_array().unwrap()[0];
    assert_eq!(listed["likesCount"], 1);
    assert_eq!(listed["commentsCount"], 1);

    // Only the owner may edit or delete.
    let (status, _) = call(
        &app,
        "PUT",
        "/wall/posts",
        Some(json!({ "postId": post_id, "content": "piraté", "userId": other })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "DELETE",
        "/wall/comments",
        Some(json!({ "commentId": comment_id, "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(
        &app,
        "PUT",
        "/wall/posts",
        Some(json!({ "postId": post_id, "content": "édité", "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "édité");

    let (status, _) = call(
        &app,
        "DELETE",
        "/wall/posts",
        Some(json!({ "postId": post_id, "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Soft-deleted posts leave the listing.
    let (_, posts) = call(&app, "GET", "/wall/posts", None).await;
    assert!(posts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn post_needs_content_or_attachment_and_caps_media() {
    let (app, _dir) = app().await;
    let (author, _) = validated_user(&app, "author@x.ma").await;

    let (status, _) = call(
        &app,
        "POST",
        "/wall/posts",
        Some(json!({ "content": "  ", "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let six_images: Vec<Value> = (0..6)
        .map(|i| json!({ "name": format!("{i}.png"), "url": format!("/uploads/image/{i}.png"), "size": 10 }))
        .collect();
    let (status, body) = call(
        &app,
        "POST",
        "/wall/posts",
        Some(json!({ "content": "trop d'images", "images": six_images, "userId": author })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Maximum 5"));
}

#[tokio::test]
async fn liking_unknown_target_is_404() {
    let (app, _dir) = app().await;
    let (user, _) = validated_user(&app, "user@x.ma").await;

    let (status, body) = call(
        &app,
        "POST",
        "/wall/likes",
        Some(json!({ "targetId": 999, "userId": user, "kind": "post" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Publication introuvable");

    let (status, body) = call(
        &app,
        "POST",
        "/wall/likes",
        Some(json!({ "targetId": 999, "userId": user, "kind": "comment" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Commentaire introuvable");
}

fn multipart_body(boundary: &str, kind: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\n{kind}\r\n"
        )
        .as_bytes(),
    );
    for (name, mime, data) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

async fn upload(app: &Router, kind: &str, files: &[(&str, &str, &[u8])]) -> (StatusCode, Value) {
    let boundary = "rre-test-boundary";
    let request = Request::builder()
        .method("POST")
        .uri("/wall/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(boundary, kind, files)))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn upload_stores_files_and_returns_urls() {
    let (app, dir) = app().await;

    let (status, body) = upload(
        &app,
        "image",
        &[("photo.png", "image/png", b"fake png bytes")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let file = &body["files"][0];
    assert_eq!(file["name"], "photo.png");
    assert_eq!(file["size"], 14);
    assert_eq!(file["type"], "image/png");
    let url = file["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/image/"));
    assert!(url.ends_with(".png"));

    let stored = dir.path().join(url.strip_prefix("/uploads/").unwrap());
    assert_eq!(std::fs::read(stored).unwrap(), b"fake png bytes");
}

#[tokio::test]
async fn upload_batch_is_all_or_nothing() {
    let (app, dir) = app().await;

    let (status, body) = upload(
        &app,
        "image",
        &[
            ("ok.png", "image/png", b"png bytes"),
            ("cv.pdf", "application/pdf", b"pdf bytes"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("non autorisé"));

    // Nothing was written, not even the valid file.
    let entries: Vec<_> = std::fs::read_dir(dir.path().join("image"))
        .unwrap()
        .collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn chat_flow() {
    let (app, _dir) = app().await;
    let (amal, _) = validated_user(&app, "amal@x.ma").await;
    let (badr, _) = validated_user(&app, "badr@x.ma").await;

    // A direct chat needs someone besides the creator.
    let (status, _) = call(
        &app,
        "POST",
        "/chat/chats",
        Some(json!({ "type": "direct", "creatorId": amal, "participantIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, chat) = call(
        &app,
        "POST",
        "/chat/chats",
        Some(json!({ "type": "direct", "creatorId": amal, "participantIds": [badr] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let chat_id = chat["id"].as_i64().unwrap();
    assert_eq!(chat["participants"].as_array().unwrap().len(), 2);
    assert!(chat["lastMessage"].is_null());

    let (status, message) = call(
        &app,
        "POST",
        "/chat/messages",
        Some(json!({ "chatId": chat_id, "senderId": amal, "content": "Salam" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message["senderName"], "Jane Alaoui");
    assert_eq!(message["isAdmin"], false);

    call(
        &app,
        "POST",
        "/chat/messages",
        Some(json!({ "chatId": chat_id, "senderId": badr, "content": "Wa salam" })),
    )
    .await;

    // Ascending history.
    let (status, messages) = call(
        &app,
        "GET",
        &format!("/chat/messages?chatId={chat_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Salam", "Wa salam"]);

    // Chat list carries the denormalized last message.
    let (status, chats) = call(&app, "GET", &format!("/chat/chats?userId={badr}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = &chats.as_array().unwrap()[0];
    assert_eq!(listed["lastMessage"]["content"], "Wa salam");

    // Unknown chat is a 404.
    let (status, _) = call(&app, "GET", "/chat/messages?chatId=999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn direct_chat_is_reused_not_duplicated() {
    let (app, _dir) = app().await;
    let (amal, _) = validated_user(&app, "amal@x.ma").await;
    let (badr, _) = validated_user(&app, "badr@x.ma").await;

    let (status, first) = call(
        &app,
        "POST",
        "/chat/chats",
        Some(json!({ "type": "direct", "creatorId": amal, "participantIds": [badr] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let chat_id = first["id"].as_i64().unwrap();

    // Same pair again, even with the roles swapped, returns the same chat.
    let (status, second) = call(
        &app,
        "POST",
        "/chat/chats",
        Some(json!({ "type": "direct", "creatorId": badr, "participantIds": [amal] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"].as_i64().unwrap(), chat_id);

    let (_, chats) = call(&app, "GET", &format!("/chat/chats?userId={amal}"), None).await;
    assert_eq!(chats.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn chat_user_search_lists_other_validated_attendees() {
    let (app, _dir) = app().await;
    let (amal, _) = validated_user(&app, "amal@x.ma").await;
    let (badr, _) = validated_user(&app, "badr@x.ma").await;

    // Registered but never validated, so invisible to the search.
    let (status, _) = call(
        &app,
        "POST",
        "/register",
        Some(registration_payload("pending@x.ma")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, users) = call(&app, "GET", &format!("/chat/users?userId={amal}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let hits = users.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"].as_i64().unwrap(), badr);
    assert_eq!(hits[0]["name"], "Jane Alaoui");
    assert_eq!(
        hits[0]["activities"].as_array().unwrap().len(),
        2 // textile + broderie from the submission
    );

    // Query narrows by email.
    let (_, filtered) = call(
        &app,
        "GET",
        &format!("/chat/users?q=badr@x.ma&userId={amal}"),
        None,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let (_, none) = call(
        &app,
        "GET",
        &format!("/chat/users?q=introuvable&userId={amal}"),
        None,
    )
    .await;
    assert!(none.as_array().unwrap().is_empty());
}
