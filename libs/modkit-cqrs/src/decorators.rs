//! Validation and logging decorators.

use std::any::type_name;
use std::sync::Arc;

use async_trait::async_trait;
use modkit_docstore::OpContext;
use modkit_errors::{AppError, AppResult, ErrorKind, Layer};
use tracing::{debug, error, info};

use crate::handler::{CommandHandler, QueryHandler};
use crate::validation::{ResponseValidation, Validator};

/// Unqualified type name used as the logged action.
fn action_name<T>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

pub struct LoggingCommand<C> {
    inner: Arc<dyn CommandHandler<C>>,
}

#[async_trait]
impl<C: Send + 'static> CommandHandler<C> for LoggingCommand<C> {
    async fn handle(&self, ctx: &OpContext, command: C) -> AppResult<()> {
        let action = action_name::<C>();
        debug!(action, "executing command");
        match self.inner.handle(ctx, command).await {
            Ok(()) => {
                info!(action, "command executed successfully");
                Ok(())
            }
            Err(err) => {
                error!(action, error = %err, "command failed");
                Err(err)
            }
        }
    }
}

pub struct ValidatingCommand<C> {
    inner: Arc<dyn CommandHandler<C>>,
    validator: Arc<dyn Validator<C>>,
}

#[async_trait]
impl<C: Send + Sync + 'static> CommandHandler<C> for ValidatingCommand<C> {
    async fn handle(&self, ctx: &OpContext, command: C) -> AppResult<()> {
        self.validator
            .validate(&command)
            .map_err(AppError::invalid_argument)?;
        self.inner.handle(ctx, command).await
    }
}

pub struct LoggingQuery<Q, R> {
    inner: Arc<dyn QueryHandler<Q, R>>,
}

#[async_trait]
impl<Q: Send + 'static, R: Send + 'static> QueryHandler<Q, R> for LoggingQuery<Q, R> {
    async fn handle(&self, ctx: &OpContext, query: Q) -> AppResult<R> {
        let action = action_name::<Q>();
        debug!(action, "executing query");
        let res = self.inner.handle(ctx, query).await;
        match &res {
            Ok(_) => info!(action, "query executed successfully"),
            Err(err) => error!(action, error = %err, "query failed"),
        }
        res
    }
}

pub struct ValidatingQuery<Q, R> {
    inner: Arc<dyn QueryHandler<Q, R>>,
    request: Arc<dyn Validator<Q>>,
    response: Arc<dyn Validator<R>>,
}

#[async_trait]
impl<Q: Send + Sync + 'static, R: Send + 'static> QueryHandler<Q, R> for ValidatingQuery<Q, R> {
    async fn handle(&self, ctx: &OpContext, query: Q) -> AppResult<R> {
        self.request
            .validate(&query)
            .map_err(AppError::invalid_argument)?;
        let response = self.inner.handle(ctx, query).await?;
        self.response.validate(&response).map_err(|errs| {
            AppError::new(ErrorKind::Internal, Layer::Internal, ResponseValidation(errs))
        })?;
        Ok(response)
    }
}

/// Wrap `handler` as `validation(logging(handler))`.
pub fn apply_command_decorators<C: Send + Sync + 'static>(
    handler: Arc<dyn CommandHandler<C>>,
    validator: Arc<dyn Validator<C>>,
) -> Arc<dyn CommandHandler<C>> {
    let logged = Arc::new(LoggingCommand { inner: handler });
    Arc::new(ValidatingCommand {
        inner: logged,
        validator,
    })
}

/// Wrap `handler` as `validation(logging(handler))`, checking both request and response.
pub fn apply_query_decorators<Q: Send + Sync + 'static, R: Send + 'static>(
    handler: Arc<dyn QueryHandler<Q, R>>,
    request: Arc<dyn Validator<Q>>,
    response: Arc<dyn Validator<R>>,
) -> Arc<dyn QueryHandler<Q, R>> {
    let logged = Arc::new(LoggingQuery { inner: handler });
    Arc::new(ValidatingQuery {
        inner: logged,
        request,
        response,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::validation::StructValidator;
    use modkit_docstore::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct RenameThing {
        #[validate(length(min = 1))]
        name: String,
    }

    #[derive(Debug, Validate)]
    struct FindThing {
        #[validate(length(min = 1))]
        id: String,
    }

    #[derive(Debug, Validate)]
    struct Thing {
        #[validate(length(min = 3))]
        label: String,
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler<RenameThing> for Counting {
        async fn handle(&self, _ctx: &OpContext, command: RenameThing) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if command.name == "boom" {
                return Err(AppError::not_found("thing 'boom'"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueryHandler<FindThing, Thing> for Counting {
        async fn handle(&self, ctx: &OpContext, query: FindThing) -> AppResult<Thing> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.run(async { Ok(()) }).await?;
            match query.id.as_str() {
                "missing" => Err(AppError::not_found("thing 'missing'")),
                "short" => Ok(Thing {
                    label: "x".to_owned(),
                }),
                _ => Ok(Thing {
                    label: "a proper label".to_owned(),
                }),
            }
        }
    }

    fn command(inner: &Arc<Counting>) -> Arc<dyn CommandHandler<RenameThing>> {
        apply_command_decorators(inner.clone(), Arc::new(StructValidator))
    }

    fn query(inner: &Arc<Counting>) -> Arc<dyn QueryHandler<FindThing, Thing>> {
        apply_query_decorators(
            inner.clone(),
            Arc::new(StructValidator),
            Arc::new(StructValidator),
        )
    }

    #[test]
    fn action_is_the_bare_type_name() {
        assert_eq!(action_name::<RenameThing>(), "RenameThing");
        assert_eq!(action_name::<Vec<u8>>(), "Vec");
    }

    #[tokio::test]
    #[traced_test]
    async fn invalid_command_never_reaches_the_handler() {
        let inner = Arc::new(Counting::default());
        let err = command(&inner)
            .handle(&OpContext::new(), RenameThing {
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
        assert!(!logs_contain("executing command"));
        assert!(!logs_contain("command failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn command_outcomes_are_logged_with_the_action() {
        let inner = Arc::new(Counting::default());
        let handler = command(&inner);

        handler
            .handle(&OpContext::new(), RenameThing {
                name: "ok".to_owned(),
            })
            .await
            .unwrap();
        assert!(logs_contain("executing command"));
        assert!(logs_contain("command executed successfully"));
        assert!(logs_contain("RenameThing"));

        let err = handler
            .handle(&OpContext::new(), RenameThing {
                name: "boom".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(logs_contain("command failed"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn caller_context_reaches_the_handler() {
        let inner = Arc::new(Counting::default());
        let ctx = OpContext::new();
        ctx.cancel();
        let err = query(&inner)
            .handle(
                &ctx,
                FindThing {
                    id: "any".to_owned(),
                },
            )
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Database);
        assert!(err.downcast_ref::<StoreError>().is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("query failed"));
    }

    #[tokio::test]
    async fn invalid_response_becomes_an_internal_error() {
        let inner = Arc::new(Counting::default());
        let err = query(&inner)
            .handle(&OpContext::new(), FindThing {
                id: "short".to_owned(),
            })
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.layer(), Layer::Internal);
        assert!(err.downcast_ref::<ResponseValidation>().is_some());
    }

    #[tokio::test]
    #[traced_test]
    async fn handler_errors_pass_through_unchanged() {
        let inner = Arc::new(Counting::default());
        let handler = query(&inner);
        let err = handler
            .handle(&OpContext::new(), FindThing {
                id: "missing".to_owned(),
            })
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.downcast_ref::<ResponseValidation>().is_none());
        assert!(logs_contain("query failed"));

        let ok = handler
            .handle(&OpContext::new(), FindThing {
                id: "any".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(ok.label, "a proper label");

        let err = handler.handle(&OpContext::new(), FindThing { id: String::new() }).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
