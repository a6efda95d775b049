use embedscout::ResolverConfig;

use super::registry_from;

pub fn cmd_dispatch(config: &ResolverConfig, url: &str) {
    match registry_from(config).dispatch(url) {
        Some(strategy) => println!("{}", strategy.name()),
        None => println!("unsupported"),
    }
}

pub fn cmd_hosts(config: &ResolverConfig) {
    let registry = registry_from(config);

    for name in registry.names() {
        let claims: Vec<String> = registry
            .registrations()
            .iter()
            .filter(|r| r.strategy.name() == name)
            .map(|r| r.predicate.to_string())
            .collect();
        let referer = registry
            .registrations()
            .iter()
            .find(|r| r.strategy.name() == name)
            .is_some_and(|r| r.strategy.requires_referer());

        println!(
            "{name:<12} {:<8} {}",
            if referer { "referer" } else { "-" },
            claims.join(", ")
        );
    }
    println!("\n({} strategies, {} host claims)", registry.names().len(), registry.len());
}
