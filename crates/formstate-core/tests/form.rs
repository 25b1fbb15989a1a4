//! Form controller behavior: values, scoped validation, messages, locks and
//! the field-change event policy.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formstate_core::{Form, FormOptions, InputElement, InputLocator, Scope};
use formstate_model::{Record, RecordAccess, record};
use formstate_store::{Readable, Same};
use formstate_validate::{NO_LOCAL_SET_MESSAGE, Suite};

type Signup = RecordAccess<String>;

/// Counts how often the suite body runs each field's tests.
#[derive(Default)]
struct Runs {
    name: Cell<u32>,
    email: Cell<u32>,
}

fn signup_suite(runs: &Rc<Runs>) -> Suite<Signup> {
    let runs = Rc::clone(runs);
    Suite::new(RecordAccess::new(), move |t| {
        t.test("name", |input| {
            runs.name.set(runs.name.get() + 1);
            input.enforce("name required").is_not_blank()?;
            Ok(())
        });
        t.test("email", |input| {
            runs.email.set(runs.email.get() + 1);
            input.enforce("email required").is_not_blank()?;
            Ok(())
        });
        t.warn("email", |input| {
            let email = input.value.unwrap_or_default();
            anyhow::ensure!(
                !email.ends_with("@example.com"),
                "example.com addresses bounce"
            );
            Ok(())
        });
    })
}

fn form_with(values: Record) -> (Form<Signup>, Rc<Runs>) {
    let runs = Rc::new(Runs::default());
    let form = Form::new(FormOptions::with_values(signup_suite(&runs), values));
    (form, runs)
}

fn empty_form() -> (Form<Signup>, Rc<Runs>) {
    form_with(record([("name", String::new())]))
}

#[test]
fn name_required_until_filled_in() {
    let (form, _) = form_with(record([
        ("name", String::new()),
        ("email", "ann@mail.org".to_string()),
    ]));

    form.test(Scope::All);
    assert!(form.is_invalid());
    assert!(!form.is_valid());
    assert_eq!(form.get_field_error("name"), "name required");
    assert_eq!(form.get_errors().len(), 1);

    form.set_field_value("name", Some("Ann".to_string()));
    form.test(Scope::All);
    assert!(form.is_valid());
    assert!(form.get_errors().is_empty());
    assert_eq!(form.get_summary().error_count, 0);
}

#[test]
fn scoped_run_keeps_other_fields_results() {
    let (form, _) = empty_form();

    form.test_field("name");
    let name_after_first = form.get_field_summary("name").unwrap();
    assert!(form.is_field_invalid("name"));
    assert!(form.is_field_untested("email"));

    form.test_field("email");
    let name_after_second = form.get_field_summary("name").unwrap();
    assert!(Rc::ptr_eq(&name_after_first, &name_after_second));
    assert!(form.is_field_invalid("email"));

    let fields: Vec<_> = form
        .get_errors()
        .into_iter()
        .map(|failure| failure.field)
        .collect();
    assert_eq!(fields, vec!["name".to_string(), "email".to_string()]);
}

#[test]
fn warnings_do_not_invalidate() {
    let (form, _) = form_with(record([
        ("name", "Ann".to_string()),
        ("email", "ann@example.com".to_string()),
    ]));
    form.test(Scope::All);

    assert!(form.is_valid());
    assert!(form.is_warned());
    assert!(form.is_field_warned("email"));
    assert!(!form.is_field_warned("name"));
    assert_eq!(form.get_field_warning("email"), "example.com addresses bounce");
    assert_eq!(form.get_field_error("email"), "");
    let warning = form.get_warning().unwrap();
    assert_eq!(warning.field, "email");
}

#[test]
fn omitted_field_counts_as_valid() {
    let suite = Suite::new(RecordAccess::<String>::new(), |t| {
        t.test("coupon", |input| {
            input.enforce("coupon required").is_not_blank()?;
            Ok(())
        });
        if t.value(&"coupon".to_string()).is_none() {
            t.omit("coupon");
        }
    });
    let form = Form::new(FormOptions::new(suite));
    form.test(Scope::All);

    assert!(form.is_omitted());
    assert!(form.is_valid());
    assert!(form.is_field_omitted("coupon"));
}

#[test]
fn field_value_accessors_share_structure() {
    let (form, _) = empty_form();
    let before = form.get_values();

    form.set_field_value("name", Some(String::new()));
    assert!(before.same(&form.get_values()));

    form.update_field_value("name", |value| value.map(|v| v + "Bo"));
    assert_eq!(form.get_field_value("name").as_deref(), Some("Bo"));

    form.remove_field_value("name");
    assert_eq!(form.get_field_value("name"), None);

    let unchanged = form.get_values();
    form.remove_field_value("name");
    assert!(unchanged.same(&form.get_values()));
}

#[test]
fn values_store_notifies_only_on_change() {
    let (form, _) = empty_form();
    let seen = Rc::new(Cell::new(0));
    let sink = Rc::clone(&seen);
    let _sub = form.values().subscribe(move |_| sink.set(sink.get() + 1));

    form.set_field_value("name", Some(String::new()));
    form.set_field_value("name", Some("Ann".to_string()));
    form.update_values(|values| Rc::clone(values));
    assert_eq!(seen.get(), 2);
}

#[test]
fn input_on_untouched_field_waits_for_blur() {
    let (form, runs) = empty_form();

    let run = form.on_field_input("name", Some("A".to_string()));
    assert!(run.is_none());
    assert!(form.is_field_touched("name"));
    assert!(form.is_field_untested("name"));
    assert_eq!(runs.name.get(), 0);

    let run = form.on_field_blur("name");
    assert!(run.is_some());
    assert_eq!(runs.name.get(), 1);
    assert!(form.is_field_visited("name"));
    assert!(form.is_field_valid("name"));

    // Tested now: a second blur does not re-validate.
    assert!(form.on_field_blur("name").is_none());
    assert_eq!(runs.name.get(), 1);
}

#[test]
fn input_on_tested_field_revalidates_only_on_change() {
    let (form, runs) = empty_form();
    form.test_field("name");
    assert_eq!(runs.name.get(), 1);

    assert!(form.on_field_input("name", Some("Ann".to_string())).is_some());
    assert_eq!(runs.name.get(), 2);
    assert!(form.is_field_valid("name"));

    assert!(form.on_field_input("name", Some("Ann".to_string())).is_none());
    assert_eq!(runs.name.get(), 2);
}

#[test]
fn input_on_visited_untested_field_validates() {
    let (form, runs) = empty_form();
    form.set_field_visited("name", true);

    assert!(form.on_field_input("name", Some(String::new())).is_some());
    assert_eq!(runs.name.get(), 1);
    assert!(form.is_field_invalid("name"));
}

#[test]
fn change_marks_touched_and_visited() {
    let (form, runs) = empty_form();

    assert!(form.on_field_change("email", Some("a@b.c".to_string())).is_some());
    assert!(form.is_field_touched("email"));
    assert!(form.is_field_visited("email"));
    assert_eq!(runs.email.get(), 1);

    // Tested and unchanged: no run.
    assert!(form.on_field_change("email", Some("a@b.c".to_string())).is_none());
    assert_eq!(runs.email.get(), 1);
    // Runs are scoped to the changed field.
    assert_eq!(runs.name.get(), 0);
}

#[test]
fn locked_field_ignores_events() {
    let (form, runs) = empty_form();
    let mut handle = form.lock_field("name");
    assert!(form.is_field_locked("name"));
    assert!(!form.is_field_locked("email"));
    let before = form.get_values();

    assert!(form.on_field_change("name", Some("Ann".to_string())).is_none());
    assert!(form.on_field_input("name", Some("Ann".to_string())).is_none());
    assert!(form.on_field_blur("name").is_none());
    assert!(before.same(&form.get_values()));
    assert!(!form.is_field_touched("name"));
    assert_eq!(runs.name.get(), 0);

    handle.release();
    assert!(form.on_field_change("name", Some("Ann".to_string())).is_some());
    assert_eq!(form.get_field_value("name").as_deref(), Some("Ann"));
    assert_eq!(runs.name.get(), 1);
}

#[test]
fn form_lock_composes_with_field_locks() {
    let (form, _) = empty_form();
    let locked = form.locked();
    let locked_fields = form.locked_fields();

    let email_lock = form.lock_field("email");
    let form_lock = form.lock();
    assert!(form.is_locked());
    assert!(locked.get());
    assert!(form.is_field_locked("name"));
    assert!(form.is_field_locked("email"));
    assert_eq!(locked_fields.get(), vec!["email".to_string()]);

    drop(form_lock);
    assert!(!form.is_locked());
    assert!(!locked.get());
    assert!(!form.is_field_locked("name"));
    assert!(form.is_field_locked("email"));

    drop(email_lock);
    assert!(!form.is_field_locked("email"));
    assert!(locked_fields.get().is_empty());
}

#[test]
fn releasing_twice_keeps_other_holders() {
    let (form, _) = empty_form();
    let mut first = form.lock_field("name");
    let _second = form.lock_field("name");

    first.release();
    first.release();
    assert!(!first.is_held());
    assert!(form.is_field_locked("name"));
}

#[test]
fn touched_and_visited_sets() {
    let (form, _) = empty_form();
    let touched = form.touched();
    assert!(!touched.get());

    form.set_field_touched("name", true);
    assert!(form.is_touched());
    assert!(touched.get());

    form.set_touched_fields(["email"]);
    assert!(!form.is_field_touched("name"));
    assert!(form.is_field_touched("email"));

    form.set_field_touched("email", false);
    assert!(!form.is_touched());

    form.visited_fields().set(Rc::new(["name".to_string()].into()));
    assert!(form.is_visited());
    assert!(form.visited().get());
}

#[test]
fn initial_touched_and_visited_come_from_options() {
    let runs = Rc::new(Runs::default());
    let form = Form::new(
        FormOptions::new(signup_suite(&runs))
            .touched(["name"])
            .visited(["email"]),
    );
    assert!(form.is_field_touched("name"));
    assert!(form.is_field_visited("email"));
}

#[test]
fn selector_stores_are_shared_and_follow_summary() {
    let (form, _) = empty_form();
    let invalid = form.invalid();
    assert!(invalid.ptr_eq(&form.invalid()));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = invalid.subscribe(move |value| sink.borrow_mut().push(value));

    form.test_field("name");
    form.test_field("name");
    form.set_field_value("name", Some("Ann".to_string()));
    form.test_field("name");
    assert_eq!(*seen.borrow(), vec![false, true, false]);
}

#[test]
fn message_stores_follow_summary() {
    let (form, _) = empty_form();
    let error = form.error();
    let errors = form.errors();
    assert_eq!(error.get(), None);

    form.test(Scope::All);
    assert_eq!(error.get().map(|failure| failure.message).as_deref(), Some("name required"));
    assert_eq!(errors.get().len(), 2);
    assert!(form.warnings().get().is_empty());
    assert!(form.warning().get().is_none());
}

#[test]
fn async_test_without_local_set_fails_the_field() {
    let suite = Suite::new(RecordAccess::<String>::new(), |t| {
        t.test_async("username", |_| async { Ok(()) });
    });
    let form = Form::new(FormOptions::new(suite));

    let run = form.test(Scope::All);
    assert!(run.is_settled());
    assert!(!form.is_pending());
    assert!(form.is_invalid());
    assert_eq!(form.get_field_error("username"), NO_LOCAL_SET_MESSAGE);
}

#[test]
fn reset_restores_initial_state() {
    let (form, _) = empty_form();
    let submitted = form.submitted();
    form.set_field_touched("name", true);
    form.test(Scope::All);
    let _lock = form.lock();
    let old_field = form.field("name");

    let runs = Rc::new(Runs::default());
    form.reset(FormOptions::with_values(
        signup_suite(&runs),
        record([("name", "Bo".to_string())]),
    ));

    assert!(!form.is_touched());
    assert!(!form.is_locked());
    assert!(form.is_untested());
    assert!(!submitted.get());
    assert_eq!(form.get_field_value("name").as_deref(), Some("Bo"));
    assert!(!old_field.ptr_eq(&form.field("name")));
    assert_eq!(old_field.get_value().as_deref(), Some("Bo"));

    form.test(Scope::All);
    assert_eq!(runs.name.get(), 1);
}

#[derive(Default)]
struct Element {
    focused: Cell<bool>,
}

impl InputElement for Element {
    fn focus(&self) {
        self.focused.set(true);
    }

    fn blur(&self) {
        self.focused.set(false);
    }
}

#[test]
fn input_locator_function() {
    let element = Rc::new(Element::default());
    let found = Rc::clone(&element);
    let runs = Rc::new(Runs::default());
    let form = Form::new(FormOptions::new(signup_suite(&runs)).input(InputLocator::function(
        move |field: &String| {
            (field == "name").then(|| Rc::clone(&found) as Rc<dyn InputElement>)
        },
    )));

    assert!(form.focus_field_input("name"));
    assert!(element.focused.get());
    assert!(form.blur_field_input("name"));
    assert!(!element.focused.get());
    assert!(!form.focus_field_input("email"));
    assert!(form.find_field_input("email").is_none());
}
