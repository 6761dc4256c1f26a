use crate::common::{MAX_UPLOAD_SIZE, TestApp, payload, routes};

const U1: i32 = 1;
const U2: i32 = 2;

mod health {
    use super::*;

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::HEALTH).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::FILES).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.get_with_token(routes::FILES, "not.a.jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_returns_public_view() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);

        let res = app
            .upload_with_token("report.pdf", Some("application/pdf"), payload(1024), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["original_name"], "report.pdf");
        assert_eq!(res.body["mime_type"], "application/pdf");
        assert_eq!(res.body["size"], 1024);
        assert_eq!(res.body["download_count"], 0);
        assert_eq!(res.body["visibility"], "private");
        assert!(res.body["created_at"].is_string());
        for internal in ["storage_key", "blob_locator", "iv", "owner_id"] {
            assert!(res.body.get(internal).is_none(), "{internal} leaked");
        }
    }

    #[tokio::test]
    async fn blob_on_disk_is_ciphertext() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);
        let secret = b"the quick brown fox jumps over the lazy dog".to_vec();

        app.upload_file(&token, "fox.txt", secret.clone()).await;

        let blobs = app.blob_paths(U1);
        assert_eq!(blobs.len(), 1);
        let stored = std::fs::read(&blobs[0]).unwrap();
        assert_eq!(stored.len(), secret.len() + 16);
        assert!(!stored.windows(9).any(|w| w == b"quick bro"));
    }

    #[tokio::test]
    async fn mime_type_is_guessed_when_part_has_none() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);

        let res = app
            .upload_with_token("photo.png", None, payload(16), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["mime_type"], "image/png");
    }

    #[tokio::test]
    async fn size_ceiling_is_inclusive() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);
        let ceiling = MAX_UPLOAD_SIZE as usize;

        let res = app
            .upload_with_token("exact.bin", None, payload(ceiling), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .upload_with_token("over.bin", None, payload(ceiling + 1), &token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let list = app.get_with_token(routes::FILES, &token).await;
        assert_eq!(list.body["total"], 1);
        assert_eq!(app.blob_paths(U1).len(), 1);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::FILES))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unsafe_names_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for(U1);

        let res = app
            .upload_with_token("..", None, payload(4), &token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.blob_paths(U1).is_empty());
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn list_is_scoped_to_caller_newest_first() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let bob = app.token_for(U2);

        let first = app.upload_file(&alice, "first.txt", payload(3)).await;
        app.upload_file(&bob, "bobs.txt", payload(3)).await;
        let second = app.upload_file(&alice, "second.txt", payload(3)).await;

        let res = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        let ids: Vec<&str> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn report_lifecycle() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let bob = app.token_for(U2);
        let data = payload(1024);

        let res = app
            .upload_with_token("report.pdf", Some("application/pdf"), data.clone(), &alice)
            .await;
        assert_eq!(res.status, 201);
        let id = res.id();

        let list = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(list.body["files"][0]["id"], id.as_str());

        let denied = app.get_with_token(&routes::file(&id), &bob).await;
        assert_eq!(denied.status, 403);
        assert_eq!(denied.body["code"], "PERMISSION_DENIED");

        let download = app.download_with_token(&routes::file(&id), &alice).await;
        assert_eq!(download.status, 200);
        assert_eq!(download.bytes, data);
        assert_eq!(download.headers["content-type"], "application/pdf");
        let disposition = download.headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("report.pdf"));

        let list = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(list.body["files"][0]["download_count"], 1);

        let res = app.delete_with_token(&routes::file(&id), &alice).await;
        assert_eq!(res.status, 204);

        let gone = app.get_with_token(&routes::file(&id), &alice).await;
        assert_eq!(gone.status, 404);
        assert_eq!(gone.body["code"], "NOT_FOUND");
        assert!(app.blob_paths(U1).is_empty());
    }

    #[tokio::test]
    async fn public_files_are_shared_for_download_only() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let bob = app.token_for(U2);

        let id = app.upload_file(&alice, "shared.txt", payload(40)).await;
        app.publish(&alice, &id).await;

        let download = app.download_with_token(&routes::file(&id), &bob).await;
        assert_eq!(download.status, 200);
        assert_eq!(download.bytes, payload(40));

        let res = app.delete_with_token(&routes::file(&id), &bob).await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(
                &routes::file(&id),
                &serde_json::json!({ "visibility": "private" }),
                &bob,
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn concurrent_downloads_are_all_counted() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "hot.bin", payload(256)).await;
        app.publish(&alice, &id).await;

        let downloads = (10..30).map(|user| {
            let token = app.token_for(user);
            let path = routes::file(&id);
            let app = &app;
            async move { app.download_with_token(&path, &token).await }
        });
        for download in futures::future::join_all(downloads).await {
            assert_eq!(download.status, 200);
            assert_eq!(download.bytes, payload(256));
        }

        let list = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(list.body["files"][0]["download_count"], 20);
    }

    #[tokio::test]
    async fn tampered_blob_fails_without_leaking() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "ledger.csv", payload(100)).await;

        let blobs = app.blob_paths(U1);
        TestApp::corrupt_blob(&blobs[0], 50);

        let res = app.get_with_token(&routes::file(&id), &alice).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "DECRYPTION_ERROR");
        assert!(!res.text.contains("files/"));
        assert!(!res.text.contains("aead"));

        let list = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(list.body["files"][0]["download_count"], 0);
    }

    #[tokio::test]
    async fn missing_blob_is_a_storage_error() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "lost.bin", payload(32)).await;

        let blobs = app.blob_paths(U1);
        std::fs::remove_file(&blobs[0]).unwrap();

        let res = app.get_with_token(&routes::file(&id), &alice).await;
        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "STORAGE_ERROR");
        assert!(!res.text.contains("files/"));

        let list = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(list.body["files"][0]["download_count"], 0);
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);

        let res = app.get_with_token(&routes::file("nope"), &alice).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .get_with_token(&routes::file("01936f0e-1234-7abc-8000-000000000001"), &alice)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "once.txt", payload(5)).await;

        assert_eq!(app.delete_with_token(&routes::file(&id), &alice).await.status, 204);
        assert_eq!(app.delete_with_token(&routes::file(&id), &alice).await.status, 404);
    }

    #[tokio::test]
    async fn stranger_cannot_delete_private_file() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let bob = app.token_for(U2);
        let id = app.upload_file(&alice, "mine.txt", payload(5)).await;

        let res = app.delete_with_token(&routes::file(&id), &bob).await;
        assert_eq!(res.status, 403);
        assert_eq!(app.blob_paths(U1).len(), 1);
    }
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn owner_toggles_visibility() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "doc.txt", payload(5)).await;

        let res = app
            .patch_with_token(
                &routes::file(&id),
                &serde_json::json!({ "visibility": "public" }),
                &alice,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["visibility"], "public");
    }

    #[tokio::test]
    async fn unknown_visibility_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let alice = app.token_for(U1);
        let id = app.upload_file(&alice, "doc.txt", payload(5)).await;

        let res = app
            .patch_with_token(
                &routes::file(&id),
                &serde_json::json!({ "visibility": "everyone" }),
                &alice,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
