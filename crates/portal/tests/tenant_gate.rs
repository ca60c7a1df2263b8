//! Integration tests for the tenant layout gate.
//!
//! Every `/associacao/{id}` page authenticates, then authorizes, then checks
//! the section against the role, before any tenant data is read.

mod common;

use axum::http::StatusCode;
use common::*;
use softget_portal::PortalConfig;

const TENANT_TABLES: [&str; 6] = [
    "Membros",
    "Lancamentos_Financeiros",
    "Patrimonio",
    "Uso_Patrimonio",
    "Obrigacoes",
    "Mandatos",
];

fn home() -> String {
    format!("/associacao/{}", ASSOCIATION)
}

fn section(slug: &str) -> String {
    format!("/associacao/{}/{}", ASSOCIATION, slug)
}

// =============================================================================
// Authentication and Authorization
// =============================================================================

mod authorization {
    use super::*;

    #[tokio::test]
    async fn test_no_session_redirects_to_login() {
        let server = create_test_server(seeded_backend());

        let response = server.get(&home()).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_no_grant_redirects_to_dashboard() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, OUTSIDER);
        let server = create_test_server(backend.clone());

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_unknown_association_looks_like_no_grant() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        let server = create_test_server(backend);

        let response = server
            .get("/associacao/does-not-exist")
            .add_header(COOKIE, cookie)
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_duplicate_grants_are_denied() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, DUPLICATED);
        let server = create_test_server(backend);

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_unknown_role_is_denied() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, UNKNOWN_ROLE);
        let server = create_test_server(backend);

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_grant_lookup_failure_fails_closed() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        backend.fail_table("Permissoes_Usuarios");
        let server = create_test_server(backend.clone());

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
        let queried = backend.queried_tables();
        assert!(TENANT_TABLES.iter().all(|t| !queried.iter().any(|q| q == t)));
    }

    #[tokio::test]
    async fn test_denied_request_reads_no_tenant_data() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, OUTSIDER);
        let server = create_test_server(backend.clone());

        server
            .get(&section("financeiro"))
            .add_header(COOKIE, cookie)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let queried = backend.queried_tables();
        assert!(queried.iter().any(|q| q == "Permissoes_Usuarios"));
        assert!(TENANT_TABLES.iter().all(|t| !queried.iter().any(|q| q == t)));
    }

    #[tokio::test]
    async fn test_grant_is_checked_on_every_request() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        let server = create_test_server(backend.clone());

        server
            .get(&home())
            .add_header(COOKIE, cookie.clone())
            .await
            .assert_status_ok();

        backend.fail_table("Permissoes_Usuarios");
        let denied = server.get(&home()).add_header(COOKIE, cookie.clone()).await;
        denied.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&denied), "/dashboard");

        backend.restore_table("Permissoes_Usuarios");
        server
            .get(&home())
            .add_header(COOKIE, cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_tenant_pages_never_write_cookies() {
        // Expiring session: the read-only gate serves it without refreshing
        let backend = seeded_backend_with_ttl(5);
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        let server = create_test_server(backend);

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status_ok();
        assert!(set_cookies(&response).is_empty());
    }
}

// =============================================================================
// Layout Frame
// =============================================================================

mod layout_frame {
    use super::*;

    #[tokio::test]
    async fn test_frame_carries_association_role_and_user() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        let server = create_test_server(backend);

        let response = server.get(&home()).add_header(COOKIE, cookie).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["association"]["id"], ASSOCIATION);
        assert_eq!(body["association"]["name"], ASSOCIATION_NAME);
        assert_eq!(body["role"], "PRESIDENTE");
        assert_eq!(body["user_email"], email(PRESIDENT));
        assert_eq!(body["section"], "dashboard");
        assert_eq!(body["navigation"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn test_navigation_follows_role() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, SECRETARY);
        let server = create_test_server(backend);

        let response = server
            .get(&section("associados"))
            .add_header(COOKIE, cookie)
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let links: Vec<(String, bool)> = body["navigation"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| {
                (
                    l["href"].as_str().unwrap().to_string(),
                    l["active"].as_bool().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            links,
            vec![
                (home(), false),
                (section("diretoria"), false),
                (section("associados"), true),
                (section("obrigacoes"), false),
            ]
        );
    }
}

// =============================================================================
// Section Enforcement
// =============================================================================

mod section_enforcement {
    use super::*;

    #[tokio::test]
    async fn test_section_outside_role_redirects_to_home() {
        let backend = seeded_backend();
        let member = signed_in_cookie(&backend, MEMBER);
        let treasurer = signed_in_cookie(&backend, TREASURER);
        let server = create_test_server(backend);

        let response = server
            .get(&section("financeiro"))
            .add_header(COOKIE, member)
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), home());

        let response = server
            .get(&section("diretoria"))
            .add_header(COOKIE, treasurer.clone())
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), home());

        server
            .get(&section("financeiro"))
            .add_header(COOKIE, treasurer)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_every_role_reaches_the_home() {
        let backend = seeded_backend();
        let server = create_test_server(backend.clone());

        for user in [PRESIDENT, TREASURER, SECRETARY, MEMBER] {
            server
                .get(&home())
                .add_header(COOKIE, signed_in_cookie(&backend, user))
                .await
                .assert_status_ok();
        }
    }

    #[tokio::test]
    async fn test_disabled_enforcement_serves_any_section() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, MEMBER);
        let config = PortalConfig {
            enforce_section_access: false,
            ..PortalConfig::for_testing()
        };
        let server = create_test_server_with_config(backend, config);

        let response = server
            .get(&section("financeiro"))
            .add_header(COOKIE, cookie)
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["role"], "ASSOCIADO");
        // The link stays hidden even though the page is served
        assert_eq!(body["navigation"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_section_is_not_found() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, PRESIDENT);
        let server = create_test_server(backend);

        let response = server
            .get(&section("configuracoes"))
            .add_header(COOKIE, cookie)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_section_without_grant_is_unauthorized() {
        let backend = seeded_backend();
        let cookie = signed_in_cookie(&backend, OUTSIDER);
        let server = create_test_server(backend);

        let response = server
            .get(&section("configuracoes"))
            .add_header(COOKIE, cookie)
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }
}
