use crate::error::CapturedFailure;
use crate::sink::PrintSink;
use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Processing function after its error type has been erased.
pub(crate) type JobFn<T, R> =
    dyn Fn(T, &PrintSink) -> Result<Option<R>, CapturedFailure> + Send + Sync;

/// Capture a returned error along with the current backtrace.
pub fn capture_error<E: Display + ?Sized>(err: &E) -> CapturedFailure {
    CapturedFailure {
        kind: std::any::type_name::<E>().to_string(),
        message: err.to_string(),
        stack: Backtrace::capture().to_string(),
    }
}

fn capture_panic(payload: Box<dyn Any + Send>) -> CapturedFailure {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };

    CapturedFailure {
        kind: "panic".to_string(),
        message,
        stack: Backtrace::capture().to_string(),
    }
}

/// Run `job` on one item. Panics are caught and reported like errors.
pub fn invoke<T, R, F>(job: &F, item: T, print: &PrintSink) -> Result<Option<R>, CapturedFailure>
where
    F: Fn(T, &PrintSink) -> Result<Option<R>, CapturedFailure> + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| job(item, print))) {
        Ok(result) => result,
        Err(payload) => Err(capture_panic(payload)),
    }
}

/// Wrap a caller's processing function so its errors become `CapturedFailure`s.
pub(crate) fn erase<T, R, E, F>(f: F) -> Box<JobFn<T, R>>
where
    T: 'static,
    R: 'static,
    F: Fn(T, &PrintSink) -> Result<Option<R>, E> + Send + Sync + 'static,
    E: Display + 'static,
{
    Box::new(move |item, print| f(item, print).map_err(|e| capture_error(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NotFound(&'static str);

    impl Display for NotFound {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "object {} not found", self.0)
        }
    }

    #[test]
    fn test_invoke_success() {
        let print = PrintSink::unbounded();
        let job = erase(|x: u32, _: &PrintSink| Ok::<_, NotFound>(Some(x * 2)));
        assert_eq!(invoke(&*job, 21, &print), Ok(Some(42)));
    }

    #[test]
    fn test_invoke_captures_error_kind_and_message() {
        let print = PrintSink::unbounded();
        let job = erase(|name: &'static str, _: &PrintSink| Err::<Option<()>, _>(NotFound(name)));

        let failure = invoke(&*job, "c", &print).unwrap_err();
        assert!(failure.kind.ends_with("NotFound"));
        assert_eq!(failure.message, "object c not found");
    }

    #[test]
    fn test_invoke_captures_panic() {
        let print = PrintSink::unbounded();
        let job = erase(|x: u32, _: &PrintSink| -> Result<Option<u32>, String> {
            if x == 3 {
                panic!("cannot handle {}", x);
            }
            Ok(Some(x))
        });

        let failure = invoke(&*job, 3, &print).unwrap_err();
        assert_eq!(failure.kind, "panic");
        assert_eq!(failure.message, "cannot handle 3");

        let failure = invoke(&|_: u32, _: &PrintSink| -> Result<Option<u32>, CapturedFailure> {
            std::panic::panic_any(17u8)
        }, 0, &print)
        .unwrap_err();
        assert_eq!(failure.message, "unknown panic");
    }
}
