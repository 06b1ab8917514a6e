use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use restlink::{Dispatcher, Registry, RequestContext, Resource, RuntimeConfig};
use serde_json::json;

fn build_dispatcher() -> Dispatcher {
    may::config().set_stack_size(0x4000);
    let mut registry = Registry::new();
    registry
        .register(
            Some("root"),
            "/",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    Ok(())
                })
                .build(),
        )
        .expect("register root");
    registry
        .register(
            Some("animals"),
            "/zoo/animals",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!([]));
                    Ok(())
                })
                .post(|ctx: &mut RequestContext| {
                    ctx.status = Some(201);
                    Ok(())
                })
                .build(),
        )
        .expect("register animals");
    registry
        .register(
            Some("animal"),
            "/zoo/animals/:id",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!({"id": ctx.param("id")}));
                    Ok(())
                })
                .put(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    Ok(())
                })
                .delete(|ctx: &mut RequestContext| {
                    ctx.status = Some(204);
                    Ok(())
                })
                .build(),
        )
        .expect("register animal");
    registry
        .register(
            Some("toy"),
            "/zoo/animals/:id/toys/:toy_id",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    Ok(())
                })
                .build(),
        )
        .expect("register toy");
    Dispatcher::new(registry, RuntimeConfig::default())
}

fn bench_match(c: &mut Criterion) {
    let dispatcher = build_dispatcher();
    c.bench_function("find_matches deep path", |b| {
        b.iter(|| {
            let matches = dispatcher
                .registry()
                .find_matches(black_box("/zoo/animals/42/toys/7"));
            black_box(matches.len())
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = build_dispatcher();
    c.bench_function("dispatch GET /zoo/animals/{id}", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::new(Method::GET, "/zoo/animals/42");
            dispatcher.dispatch(&mut ctx).expect("dispatch");
            black_box(ctx.status)
        })
    });
}

fn bench_url(c: &mut Criterion) {
    let dispatcher = build_dispatcher();
    c.bench_function("url generation", |b| {
        b.iter(|| dispatcher.url(black_box("animal"), &["42"]).expect("url"))
    });
}

criterion_group!(benches, bench_match, bench_dispatch, bench_url);
criterion_main!(benches);
