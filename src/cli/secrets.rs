//! Secrets lifecycle command handlers
//!
//! Bridges the clap argument parsing with the secrets store, the
//! asymmetric encryptor, and the interactive editor. This is the only
//! layer that prints operator guidance, and it only ever prints
//! non-secret data: public keys, file paths, and key names.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::{EditorPolicy, Environment};
use crate::crypto::{decrypt_file, encrypt_file, Identity};
use crate::error::{TallyError, TallyResult};
use crate::secrets::{SecretsBundle, SecretsStore};

use super::scratch::ScratchFile;

/// Generate an environment's keypair
///
/// Refuses to overwrite an existing identity file unless the operator
/// explicitly confirms; a declined overwrite is a failure, not a no-op.
pub fn keygen(store: &SecretsStore, environment: Environment) -> TallyResult<()> {
    let path = store.paths().identity_file(environment);

    if path.exists() {
        println!("An identity file already exists at {}.", path.display());
        println!("Overwriting it will make existing secrets files for this environment unreadable");
        println!("until they are re-encrypted to the new key.");
        if !confirm("Overwrite?")? {
            return Err(TallyError::Config(format!(
                "Declined to overwrite existing identity file {}",
                path.display()
            )));
        }
    }

    let identity = Identity::generate();
    identity.save(&path)?;

    println!("Generated identity for {} at {}", environment, path.display());
    println!("Public key: {}", identity.recipient());
    Ok(())
}

/// Create an environment's secrets bundle interactively
pub fn new_bundle(
    store: &SecretsStore,
    editor: &EditorPolicy,
    environment: Environment,
) -> TallyResult<()> {
    let identity = match store.identity(environment) {
        Ok(identity) => identity,
        Err(err) => {
            eprintln!(
                "No identity for {}. Run 'tally-secrets keygen {}' first.",
                environment, environment
            );
            return Err(err);
        }
    };

    let secrets_path = store.paths().secrets_file(environment);
    if store.exists(environment) {
        println!("Secrets for {} already exist at {}.", environment, secrets_path.display());
        if !confirm("Replace them?")? {
            return Err(TallyError::Config(format!(
                "Declined to replace existing secrets file {}",
                secrets_path.display()
            )));
        }
    }

    let template = SecretsBundle::template().to_json_pretty()?;

    // Scratch file is shredded on every exit path, editor failure included
    let scratch = ScratchFile::with_contents(template.as_bytes())?;
    editor.edit(scratch.path())?;
    let edited = scratch.read_to_string()?;

    store.save_document(environment, &edited, &[identity.recipient()])?;

    println!("Wrote encrypted secrets for {} to {}", environment, secrets_path.display());
    Ok(())
}

/// Edit an environment's existing secrets bundle
///
/// Skips re-encryption when the decrypted content comes back unchanged,
/// so a no-op edit produces no write and no spurious ciphertext churn.
pub fn edit_bundle(
    store: &SecretsStore,
    editor: &EditorPolicy,
    environment: Environment,
) -> TallyResult<()> {
    let document = store.load_document(environment)?;
    let recipients = store.recipients(environment)?;
    let before = checksum(document.as_bytes());

    let scratch = ScratchFile::with_contents(document.as_bytes())?;
    editor.edit(scratch.path())?;
    let edited = scratch.read_to_string()?;

    if checksum(edited.as_bytes()) == before {
        println!("No changes; {} left untouched.", store.paths().secrets_file(environment).display());
        return Ok(());
    }

    store.save_document(environment, &edited, &recipients)?;

    println!("Updated encrypted secrets for {}.", environment);
    Ok(())
}

/// Print every environment's public key
///
/// Never fails hard; environments without an identity are reported
/// per line. Private keys are never printed.
pub fn show_keys(store: &SecretsStore) -> TallyResult<()> {
    for environment in Environment::all() {
        let path = store.paths().identity_file(environment);
        match Identity::load(&path) {
            Ok(identity) => {
                println!("{:<12} {}", environment, identity.recipient());
            }
            Err(_) => {
                println!("{:<12} (no identity at {})", environment, path.display());
            }
        }
    }
    Ok(())
}

/// Encrypt an arbitrary file with the default (development) identity
pub fn encrypt_path(store: &SecretsStore, file: &Path) -> TallyResult<()> {
    let identity = store.identity(Environment::Development)?;

    let mut output = file.as_os_str().to_os_string();
    output.push(".enc");
    let output = PathBuf::from(output);

    encrypt_file(file, &[identity.recipient()], &output)?;

    println!("Encrypted {} to {}", file.display(), output.display());
    Ok(())
}

/// Decrypt an arbitrary file with the default (development) identity
pub fn decrypt_path(store: &SecretsStore, file: &Path) -> TallyResult<()> {
    let identity = store.identity(Environment::Development)?;
    let plaintext = decrypt_file(file, &identity)?;

    let output = match file.to_str().and_then(|s| s.strip_suffix(".enc")) {
        Some(stripped) => PathBuf::from(stripped),
        None => {
            let mut name = file.as_os_str().to_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
    };

    if output.exists() {
        return Err(TallyError::Config(format!(
            "Refusing to overwrite existing file {}",
            output.display()
        )));
    }

    std::fs::write(&output, plaintext)
        .map_err(|e| TallyError::Io(format!("Failed to write {}: {}", output.display(), e)))?;

    println!("Decrypted {} to {}", file.display(), output.display());
    Ok(())
}

/// SHA-256 content checksum used for change detection
fn checksum(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Ask a yes/no question on stdout, reading the answer from stdin
fn confirm(prompt: &str) -> TallyResult<bool> {
    print!("{} (yes/no): ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
