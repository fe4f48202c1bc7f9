use super::*;

fn post(
    id: &str,
    title: &str,
    description: &str,
    subject: Subject,
    kind: PostKind,
    created: &str,
) -> Post {
    PostBuilder::new()
        .id(id)
        .title(title)
        .description(description)
        .author("Jane Smith")
        .author_id("user-1")
        .subject(subject)
        .kind(kind)
        .created(DateTime::try_from(created).unwrap())
        .build()
}

fn sample_feed() -> Vec<Post> {
    vec![
        post(
            "a",
            "Calculus Basics",
            "Limits and derivatives.",
            Subject::Mathematics,
            PostKind::Note,
            "2023-03-15",
        ),
        post(
            "b",
            "Kinematics",
            "Motion in one dimension.",
            Subject::Physics,
            PostKind::Note,
            "2023-03-14",
        ),
        post(
            "c",
            "Linear Algebra Problem Set",
            "Due next friday.",
            Subject::Mathematics,
            PostKind::Assignment,
            "2023-03-13",
        ),
        post(
            "d",
            "E-commerce Website",
            "Group project for web dev.",
            Subject::WebDevelopment,
            PostKind::Project,
            "2023-03-12",
        ),
    ]
}

#[test]
fn unconstrained_criteria_are_identity() {
    let posts = sample_feed();
    let criteria = FilterCriteria::all();
    assert!(criteria.is_unconstrained());
    let out: Vec<&Post> = filtered(&posts, &criteria).collect();
    assert_eq!(out.len(), posts.len());
    for (got, expected) in out.iter().zip(posts.iter()) {
        assert_eq!(got.id(), expected.id());
    }
}

#[test]
fn filtering_preserves_relative_order() {
    let posts = sample_feed();
    let criteria = FilterCriteria {
        subject: Some(Subject::Mathematics),
        ..FilterCriteria::all()
    };
    let out: Vec<&Post> = filtered(&posts, &criteria).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id(), &PostId::from("a"));
    assert_eq!(out[1].id(), &PostId::from("c"));
    for p in &out {
        assert_eq!(p.subject(), Subject::Mathematics);
    }
}

#[test]
fn subject_filter_is_idempotent() {
    let posts = sample_feed();
    let criteria = FilterCriteria {
        subject: Some(Subject::Mathematics),
        ..FilterCriteria::all()
    };
    let once: Vec<Post> =
        filtered(&posts, &criteria).cloned().collect();
    let twice: Vec<Post> =
        filtered(&once, &criteria).cloned().collect();
    assert_eq!(once, twice);
}

#[test]
fn all_criteria_must_hold() {
    let posts = sample_feed();
    let criteria = FilterCriteria {
        subject: Some(Subject::Mathematics),
        kind: Some(PostKind::Assignment),
        query: "algebra".into(),
    };
    let out: Vec<&Post> = filtered(&posts, &criteria).collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), &PostId::from("c"));
}

#[test]
fn query_is_case_insensitive() {
    let posts = vec![post(
        "a",
        "Advanced mathematics notes",
        "",
        Subject::Mathematics,
        PostKind::Note,
        "2023-03-15",
    )];
    let criteria = FilterCriteria {
        query: "MATH".into(),
        ..FilterCriteria::all()
    };
    assert_eq!(filtered(&posts, &criteria).count(), 1);
}

#[test]
fn query_searches_description_too() {
    let posts = sample_feed();
    let criteria = FilterCriteria {
        query: "friday".into(),
        ..FilterCriteria::all()
    };
    let out: Vec<&Post> = filtered(&posts, &criteria).collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), &PostId::from("c"));
}

#[test]
fn whitespace_query_matches_literally() {
    // The query is not trimmed; a lone space only matches posts whose
    // title or description contain a space.
    let posts = vec![
        post(
            "a",
            "Calculus",
            "",
            Subject::Mathematics,
            PostKind::Note,
            "2023-03-15",
        ),
        post(
            "b",
            "Calculus Basics",
            "",
            Subject::Mathematics,
            PostKind::Note,
            "2023-03-14",
        ),
    ];
    let criteria = FilterCriteria {
        query: " ".into(),
        ..FilterCriteria::all()
    };
    let out: Vec<&Post> = filtered(&posts, &criteria).collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), &PostId::from("b"));
}

#[test]
fn empty_input_yields_empty_output() {
    let posts: Vec<Post> = Vec::new();
    let criteria = FilterCriteria {
        subject: Some(Subject::History),
        kind: Some(PostKind::StudyGuide),
        query: "anything".into(),
    };
    assert_eq!(filtered(&posts, &criteria).count(), 0);
}

#[test]
fn subject_match_is_case_sensitive_exact() {
    assert!(Subject::try_from("Computer Science").is_ok());
    assert!(Subject::try_from("computer science").is_err());
    assert!(Subject::try_from("Mathematics ").is_err());
}

#[test]
fn kind_wire_strings_round_trip() {
    for kind in PostKind::all() {
        let as_json = serde_json::to_string(kind).unwrap();
        let back: PostKind = serde_json::from_str(&as_json).unwrap();
        assert_eq!(*kind, back);
    }
    assert_eq!(
        serde_json::to_string(&PostKind::StudyGuide).unwrap(),
        "\"study-guide\""
    );
}

#[test]
fn post_set_dedups_and_sorts_newest_first() {
    let mut set = PostSet::new(16);
    for p in sample_feed() {
        set.add(p);
    }
    // Duplicate id, ignored.
    set.add(post(
        "a",
        "Calculus Basics (edited)",
        "",
        Subject::Mathematics,
        PostKind::Note,
        "2023-03-16",
    ));
    assert_eq!(set.len(), 4);

    set.sort();
    let slice = set.as_slice();
    for pair in slice.windows(2) {
        assert!(pair[0].created() >= pair[1].created());
    }
    assert_eq!(slice[0].id(), &PostId::from("a"));
}

#[test]
fn post_set_truncates_to_max_length() {
    let mut set = PostSet::new(2);
    for p in sample_feed() {
        set.add(p);
    }
    set.sort();
    assert_eq!(set.len(), 2);
    assert_eq!(set.as_slice()[0].id(), &PostId::from("a"));
    assert_eq!(set.as_slice()[1].id(), &PostId::from("b"));
}

#[test]
fn filtered_posts_from_set() {
    let mut set = PostSet::new(16);
    for p in sample_feed() {
        set.add(p);
    }
    set.sort();
    let criteria = FilterCriteria {
        kind: Some(PostKind::Note),
        ..FilterCriteria::all()
    };
    let out: Vec<&Post> = set.filtered(&criteria).collect();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|p| p.kind() == PostKind::Note));
}

#[test]
fn datetime_parses_bare_dates() {
    let dt = DateTime::try_from("2023-03-15").unwrap();
    assert_eq!(dt.to_iso8601(), "2023-03-15T00:00:00+00:00");
    let rt = DateTime::try_from(&dt.to_iso8601()).unwrap();
    assert_eq!(dt, rt);
}
