//! Staff admin panel: access, owner scoping, change forms and quota-free
//! creation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use axum::http::StatusCode;

use common::{PASSWORD, TestApp, link_form, work_order_form};
use divert_server::storage::{LinkParams, ListFilter, NumberParams};

fn link_params(identifier: &str) -> LinkParams {
    LinkParams {
        work_order_id: None,
        country: "JP".to_string(),
        identifier: identifier.to_string(),
        description: String::new(),
        status: 0,
    }
}

#[tokio::test]
async fn regular_accounts_are_kept_out() {
    let app = TestApp::new().await;
    app.account("alice", 10).await;
    let cookie = app.login("alice").await;

    for uri in ["/admin/", "/admin/links/", "/admin/announcements/"] {
        let resp = app.get(uri, Some(&cookie)).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{uri}");
    }
    app.get("/admin/", None)
        .await
        .assert_redirect("/login/?next=%2Fadmin%2F");
}

#[tokio::test]
async fn index_lists_sections_by_privilege() {
    let app = TestApp::new().await;
    app.staff("sam").await;
    app.superuser("root").await;

    let staff = app.get("/admin/", Some(&app.login("sam").await)).await;
    let root = app.get("/admin/", Some(&app.login("root").await)).await;
    let names = |body: &serde_json::Value| -> Vec<String> {
        body["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect()
    };
    assert!(!names(&staff.body).contains(&"Accounts".to_string()));
    assert!(names(&root.body).contains(&"Accounts".to_string()));
    assert_eq!(root.body["site_header"], "Divert administration");
}

#[tokio::test]
async fn staff_see_only_their_own_rows() {
    let app = TestApp::new().await;
    let sam = app.staff("sam").await;
    let bob = app.account("bob", 10).await;
    app.superuser("root").await;
    app.db().create_link(sam.id, &link_params("s1")).await.unwrap();
    let bobs = app.db().create_link(bob.id, &link_params("b1")).await.unwrap();

    let sam_cookie = app.login("sam").await;
    let list = app.get("/admin/links/", Some(&sam_cookie)).await;
    assert_eq!(list.items().len(), 1);
    assert_eq!(list.items()[0]["identifier"], "s1");

    let delete = format!("/admin/links/{}/delete/", bobs.id);
    let resp = app.post(&delete, Some(&sam_cookie), &[]).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(app.db().get_link(bobs.id).await.is_ok());

    let root_cookie = app.login("root").await;
    let list = app.get("/admin/links/", Some(&root_cookie)).await;
    assert_eq!(list.items().len(), 2);

    // Owner names are searchable from the admin changelist.
    let list = app.get("/admin/links/?q=bob", Some(&root_cookie)).await;
    assert_eq!(list.items().len(), 1);
    assert_eq!(list.items()[0]["identifier"], "b1");
}

#[tokio::test]
async fn staff_additions_are_stamped_and_unlimited() {
    let app = TestApp::new().await;
    let sam = app.staff("sam").await;
    let bob = app.account("bob", 10).await;
    let cookie = app.login("sam").await;

    // Staff accounts default to a quota of 10; the admin ignores it.
    let bob_id = bob.id.to_string();
    for i in 0..12 {
        let identifier = format!("s{i}");
        let mut form = link_form(&identifier);
        form.push(("owner", &bob_id));
        app.post("/admin/links/add/", Some(&cookie), &form)
            .await
            .assert_redirect("/admin/links/");
    }
    assert_eq!(app.db().count_links_owned(sam.id).await.unwrap(), 12);
    assert_eq!(app.db().count_links_owned(bob.id).await.unwrap(), 0);
}

#[tokio::test]
async fn superuser_must_choose_an_existing_owner() {
    let app = TestApp::new().await;
    let bob = app.account("bob", 10).await;
    app.superuser("root").await;
    let cookie = app.login("root").await;

    let resp = app.post("/admin/links/add/", Some(&cookie), &link_form("r1")).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("owner").is_empty());

    let mut form = link_form("r1");
    form.push(("owner", "9999"));
    let resp = app.post("/admin/links/add/", Some(&cookie), &form).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("owner").is_empty());

    let bob_id = bob.id.to_string();
    let mut form = link_form("r1");
    form.push(("owner", &bob_id));
    app.post("/admin/links/add/", Some(&cookie), &form)
        .await
        .assert_redirect("/admin/links/");
    let links = app.db().links_owned_by(bob.id).await.unwrap();
    assert_eq!(links.len(), 1);

    let index = app.get("/admin/links/", Some(&cookie)).await;
    assert_eq!(index.messages(), vec!["The link \"r1\" was added successfully."]);
}

#[tokio::test]
async fn staff_references_are_scoped() {
    let app = TestApp::new().await;
    let _sam = app.staff("sam").await;
    let bob = app.account("bob", 10).await;
    let bobs = app.db().create_link(bob.id, &link_params("b1")).await.unwrap();
    let cookie = app.login("sam").await;

    let bobs_id = bobs.id.to_string();
    let resp = app
        .post(
            "/admin/numbers/add/",
            Some(&cookie),
            &[("num", "5550100"), ("link", &bobs_id)],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("link").is_empty());
    assert_eq!(
        app.db()
            .count_numbers(&ListFilter::default())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn status_changes_from_the_changelist() {
    let app = TestApp::new().await;
    let sam = app.staff("sam").await;
    let number = app
        .db()
        .create_number(
            sam.id,
            &NumberParams {
                work_order_id: None,
                link_id: None,
                number_type: 1,
                num: "5550100".to_string(),
                status: 0,
            },
        )
        .await
        .unwrap();
    let cookie = app.login("sam").await;

    let uri = format!("/admin/numbers/{}/status/", number.id);
    app.post(&uri, Some(&cookie), &[("status", "1")])
        .await
        .assert_redirect("/admin/numbers/");
    assert_eq!(app.db().get_number(number.id).await.unwrap().status, 1);

    let resp = app.post(&uri, Some(&cookie), &[("status", "7")]).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

    let list = app.get("/admin/numbers/?status=1", Some(&cookie)).await;
    assert_eq!(list.items().len(), 1);
    let list = app.get("/admin/numbers/?status=0", Some(&cookie)).await;
    assert!(list.items().is_empty());
}

#[tokio::test]
async fn superuser_manages_accounts() {
    let app = TestApp::new().await;
    app.staff("sam").await;
    app.superuser("root").await;

    let sam_cookie = app.login("sam").await;
    let resp = app.get("/admin/accounts/", Some(&sam_cookie)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let cookie = app.login("root").await;
    let resp = app
        .post(
            "/admin/accounts/add/",
            Some(&cookie),
            &[
                ("name", "carol"),
                ("password1", PASSWORD),
                ("password2", "something-else"),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resp.field_errors("password2"),
        vec!["The two password fields didn't match."]
    );

    let resp = app
        .post(
            "/admin/accounts/add/",
            Some(&cookie),
            &[
                ("name", "carol"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let carol = app.db().get_account_by_name("carol").await.unwrap();
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/admin/accounts/{}/edit/", carol.id).as_str())
    );

    let resp = app
        .post(
            "/admin/accounts/add/",
            Some(&cookie),
            &[
                ("name", "carol"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("name").is_empty());

    let edit = format!("/admin/accounts/{}/edit/", carol.id);
    app.post(
        &edit,
        Some(&cookie),
        &[("level", "3"), ("link_quota", "1"), ("is_active", "true")],
    )
    .await
    .assert_redirect("/admin/accounts/");
    let carol = app.db().get_account(carol.id).await.unwrap();
    assert_eq!(carol.level, 3);
    assert_eq!(carol.link_quota, 1);
    assert!(!carol.is_staff);

    let list = app.get("/admin/accounts/?level=3", Some(&cookie)).await;
    assert_eq!(list.items().len(), 1);
    assert!(list.items()[0].get("password_hash").is_none());
}

#[tokio::test]
async fn announcements_and_rules_round_trip_through_the_admin() {
    let app = TestApp::new().await;
    app.staff("sam").await;
    let cookie = app.login("sam").await;

    app.post(
        "/admin/announcements/add/",
        Some(&cookie),
        &[("title", "Maintenance"), ("content", "Down at noon")],
    )
    .await
    .assert_redirect("/admin/announcements/");
    let list = app.get("/admin/announcements/?is_active=1", Some(&cookie)).await;
    assert_eq!(list.items().len(), 1);

    for (name, priority) in [("low", "1"), ("high", "9")] {
        app.post(
            "/admin/diversion/rules/add/",
            Some(&cookie),
            &[
                ("name", name),
                ("source_pattern", "10.0.0.0/8"),
                ("destination", "https://landing.example"),
                ("priority", priority),
            ],
        )
        .await
        .assert_redirect("/admin/diversion/rules/");
    }
    let rules = app.get("/admin/diversion/rules/", Some(&cookie)).await;
    let names: Vec<&str> = rules
        .items()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["high", "low"]);

    let resp = app
        .post(
            "/admin/diversion/traffic/add/",
            Some(&cookie),
            &[
                ("source_ip", "192.0.2.7"),
                ("destination", "https://landing.example"),
                ("status", "diverted"),
            ],
        )
        .await;
    resp.assert_redirect("/admin/diversion/traffic/");
    let traffic = app
        .get("/admin/diversion/traffic/?status=diverted", Some(&cookie))
        .await;
    assert_eq!(traffic.items().len(), 1);
    assert_eq!(traffic.items()[0]["source_ip"], "192.0.2.7");
}

#[tokio::test]
async fn superuser_change_forms_reassign_the_owner() {
    let app = TestApp::new().await;
    let alice = app.account("alice", 10).await;
    let bob = app.account("bob", 10).await;
    app.superuser("root").await;
    let link = app.db().create_link(alice.id, &link_params("a1")).await.unwrap();
    let number = app
        .db()
        .create_number(
            alice.id,
            &NumberParams {
                work_order_id: None,
                link_id: Some(link.id),
                number_type: 1,
                num: "5550100".to_string(),
                status: 0,
            },
        )
        .await
        .unwrap();
    let cookie = app.login("root").await;

    let edit = format!("/admin/links/{}/edit/", link.id);
    let form = app.get(&edit, Some(&cookie)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.field_value("owner"), Some(alice.id.to_string()));
    assert_eq!(form.field_value("identifier").as_deref(), Some("a1"));

    let bob_id = bob.id.to_string();
    let mut submit = link_form("a1");
    submit.push(("owner", &bob_id));
    submit.push(("status", "1"));
    app.post(&edit, Some(&cookie), &submit)
        .await
        .assert_redirect("/admin/links/");
    let moved = app.db().get_link(link.id).await.unwrap();
    assert_eq!((moved.owner_id, moved.status), (bob.id, 1));

    let link_id = link.id.to_string();
    app.post(
        &format!("/admin/numbers/{}/edit/", number.id),
        Some(&cookie),
        &[("owner", &bob_id), ("num", "5550111"), ("link", &link_id)],
    )
    .await
    .assert_redirect("/admin/numbers/");
    let number = app.db().get_number(number.id).await.unwrap();
    assert_eq!((number.owner_id, number.num.as_str()), (bob.id, "5550111"));

    let alice_id = alice.id.to_string();
    let mut order = work_order_form("campaign");
    order.push(("owner", &alice_id));
    app.post("/admin/workorders/add/", Some(&cookie), &order)
        .await
        .assert_redirect("/admin/workorders/");
    let order_id = app.db().work_orders_owned_by(alice.id).await.unwrap()[0].id;
    let mut order = work_order_form("campaign 2");
    order.push(("owner", &bob_id));
    app.post(
        &format!("/admin/workorders/{order_id}/edit/"),
        Some(&cookie),
        &order,
    )
    .await
    .assert_redirect("/admin/workorders/");
    let changed = app.db().get_work_order(order_id).await.unwrap();
    assert_eq!((changed.owner_id, changed.name.as_str()), (bob.id, "campaign 2"));

    let list = app.get("/admin/workorders/", Some(&cookie)).await;
    assert_eq!(
        list.messages(),
        vec![
            "The link \"a1\" was changed successfully.",
            "The number \"5550111\" was changed successfully.",
            "The work order \"campaign\" was added successfully.",
            "The work order \"campaign 2\" was changed successfully.",
        ]
    );
}

#[tokio::test]
async fn staff_change_forms_stay_in_scope() {
    let app = TestApp::new().await;
    let sam = app.staff("sam").await;
    let bob = app.account("bob", 10).await;
    let mine = app.db().create_link(sam.id, &link_params("s1")).await.unwrap();
    app.db().create_link(sam.id, &link_params("s2")).await.unwrap();
    let bobs = app.db().create_link(bob.id, &link_params("b1")).await.unwrap();
    let cookie = app.login("sam").await;

    let edit = format!("/admin/links/{}/edit/", bobs.id);
    assert_eq!(app.get(&edit, Some(&cookie)).await.status, StatusCode::NOT_FOUND);
    let resp = app.post(&edit, Some(&cookie), &link_form("taken")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.db().get_link(bobs.id).await.unwrap().identifier, "b1");

    let edit = format!("/admin/links/{}/edit/", mine.id);
    let resp = app.post(&edit, Some(&cookie), &link_form("s2")).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("identifier").is_empty());

    let bob_id = bob.id.to_string();
    let mut submit = link_form("s1-renamed");
    submit.push(("owner", &bob_id));
    app.post(&edit, Some(&cookie), &submit)
        .await
        .assert_redirect("/admin/links/");
    let kept = app.db().get_link(mine.id).await.unwrap();
    assert_eq!((kept.owner_id, kept.identifier.as_str()), (sam.id, "s1-renamed"));
}

#[tokio::test]
async fn traffic_can_be_corrected_and_removed() {
    let app = TestApp::new().await;
    let sam = app.staff("sam").await;
    let cookie = app.login("sam").await;

    app.post(
        "/admin/diversion/traffic/add/",
        Some(&cookie),
        &[
            ("source_ip", "192.0.2.7"),
            ("destination", "https://landing.example"),
            ("status", "pending"),
        ],
    )
    .await
    .assert_redirect("/admin/diversion/traffic/");
    let list = app.get("/admin/diversion/traffic/", Some(&cookie)).await;
    let id = list.items()[0]["id"].as_i64().unwrap();
    let recorded_at = list.items()[0]["timestamp"].as_i64().unwrap();

    let edit = format!("/admin/diversion/traffic/{id}/edit/");
    let form = app.get(&edit, Some(&cookie)).await;
    assert_eq!(form.field_value("status").as_deref(), Some("pending"));

    let resp = app
        .post(
            &edit,
            Some(&cookie),
            &[
                ("source_ip", "192.0.2.7"),
                ("destination", "https://landing.example"),
                ("status", "diverted"),
                ("processed_by", "9999"),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!resp.field_errors("processed_by").is_empty());

    let sam_id = sam.id.to_string();
    app.post(
        &edit,
        Some(&cookie),
        &[
            ("source_ip", "192.0.2.7"),
            ("destination", "https://landing.example"),
            ("status", "diverted"),
            ("processed_by", &sam_id),
        ],
    )
    .await
    .assert_redirect("/admin/diversion/traffic/");

    let by_sam = app
        .get(
            &format!("/admin/diversion/traffic/?processed_by={sam_id}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(by_sam.items().len(), 1);
    assert_eq!(by_sam.items()[0]["status"], "diverted");
    assert_eq!(by_sam.items()[0]["timestamp"].as_i64(), Some(recorded_at));
    let bad = app
        .get("/admin/diversion/traffic/?processed_by=sam", Some(&cookie))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    app.post(&format!("/admin/diversion/traffic/{id}/delete/"), Some(&cookie), &[])
        .await
        .assert_redirect("/admin/diversion/traffic/");
    let detail = app
        .get(&format!("/admin/diversion/traffic/{id}/"), Some(&cookie))
        .await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn end_dates_and_creators_filter_changelists() {
    let app = TestApp::new().await;
    let root = app.superuser("root").await;
    let cookie = app.login("root").await;
    let root_id = root.id.to_string();

    for (name, end) in [("january", "2025-01-31T00:00"), ("march", "2025-03-31T00:00")] {
        let mut form: Vec<(&str, &str)> = work_order_form(name)
            .into_iter()
            .filter(|(k, _)| *k != "end_time")
            .collect();
        form.push(("end_time", end));
        form.push(("owner", &root_id));
        app.post("/admin/workorders/add/", Some(&cookie), &form)
            .await
            .assert_redirect("/admin/workorders/");
    }
    let late = app
        .get("/admin/workorders/?end_from=2025-03-01", Some(&cookie))
        .await;
    assert_eq!(late.items().len(), 1);
    assert_eq!(late.items()[0]["name"], "march");
    let early = app
        .get("/admin/workorders/?end_to=2025-01-31", Some(&cookie))
        .await;
    assert_eq!(early.items().len(), 1);
    assert_eq!(early.items()[0]["name"], "january");

    let lapsing = app
        .get("/admin/accounts/?end_to=2100-01-01", Some(&cookie))
        .await;
    assert_eq!(lapsing.items().len(), 1);
    let none = app
        .get("/admin/accounts/?end_from=2100-01-01", Some(&cookie))
        .await;
    assert!(none.items().is_empty());

    app.post(
        "/admin/diversion/rules/add/",
        Some(&cookie),
        &[
            ("name", "mine"),
            ("source_pattern", "*"),
            ("destination", "https://landing.example"),
        ],
    )
    .await
    .assert_redirect("/admin/diversion/rules/");
    let rules = app
        .get(
            &format!("/admin/diversion/rules/?created_by={root_id}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(rules.items().len(), 1);
    let rules = app
        .get("/admin/diversion/rules/?created_by=9999", Some(&cookie))
        .await;
    assert!(rules.items().is_empty());
}
